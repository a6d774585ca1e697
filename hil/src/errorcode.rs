//! A small error enum for hardware-level failures reported by `hil` trait
//! methods.
//!
//! Scoped down from `kernel::ErrorCode` (Tock's syscall-facing error enum)
//! to just the variants a GPIO/timer peripheral driver underneath this PHY
//! could plausibly return; PHY-level outcomes (`busy`, `overflow`, ...) are
//! a separate concern, see `ir_phy::status::IrStatus`.

/// Failure reason for a `hil` trait operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Generic failure.
    Fail,
    /// The operation cannot be performed right now because the peripheral
    /// is already doing something else.
    Busy,
    /// The requested configuration is not supported by this peripheral.
    NoSupport,
    /// An argument was out of range.
    Invalid,
    /// The peripheral is off/not initialized.
    Off,
}
