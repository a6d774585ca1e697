//! Named PHY-level outcomes (spec §7).
//!
//! `IrStatus` carries every outcome spec §7 names as a single enum,
//! used both as the error type of `Result<T, IrStatus>` for synchronous
//! Tx calls and as a plain value stored in a capture buffer's `status`
//! field for Rx — per spec §7, "names carry meaning, not a type".

/// A named outcome of a Tx or Rx PHY operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IrStatus {
    /// Normal completion.
    Ok,
    /// Tx PHY already transmitting; caller should wait and retry.
    Busy,
    /// Tx descriptor queue full, or Rx current buffer's element array
    /// full.
    Overflow,
    /// Rx buffer bank has no `empty` buffer available for writing.
    NoMemory,
    /// Tx queue drained (internal; surfaced to the Tx ISR only).
    BadData,
    /// Rx mark duration exceeded the configured watchdog.
    Timeout,
}
