//! Carrier modulator: on/off control of the auto-toggling timer output
//! that drives the IR LED at a fixed demodulator-tuned frequency (spec
//! §4.2).
//!
//! Generalized from `kernel::hil::pwm::PwmPin` the way
//! `capsules/src/buzzer_pwm.rs` drives one (`start`/`stop`), but with no
//! variable duty cycle: §4.2 only ever asks for carrier on or off, so
//! `CarrierFrequency` is a closed enum of the six tuning points in the
//! spec's table rather than an arbitrary `u32` Hz plus a runtime range
//! check.

/// One of the demodulator tuning points from spec §4.2's table.
///
/// `period()` is the counter-top value to program into the carrier
/// timer for auto-toggle output at (approximately) this frequency,
/// derived as `period = GCLK_FREQ / (2 * carrier_hz)` clamped to
/// `[25, 255]` and pre-computed here for the spec's 8 MHz generator
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum CarrierFrequency {
    Khz30,
    Khz33,
    Khz36,
    Khz38,
    Khz40,
    Khz56,
}

impl CarrierFrequency {
    /// Counter-top value for this tuning point at the spec's 8 MHz
    /// generator clock (spec §4.2's table, reproduced verbatim).
    pub const fn period(self) -> u8 {
        match self {
            CarrierFrequency::Khz30 => 132,
            CarrierFrequency::Khz33 => 120,
            CarrierFrequency::Khz36 => 110,
            CarrierFrequency::Khz38 => 104,
            CarrierFrequency::Khz40 => 99,
            CarrierFrequency::Khz56 => 70,
        }
    }

    /// Compute the counter-top value for an arbitrary carrier frequency
    /// at the given generator clock, clamped to the valid `[25, 255]`
    /// range for the spec's 8-bit carrier timer (spec §4.2's general
    /// formula, for tuning points outside the enumerated table).
    pub fn period_for(gclk_hz: u32, carrier_hz: u32) -> u8 {
        let raw = gclk_hz / (2 * carrier_hz);
        raw.clamp(25, 255) as u8
    }
}

/// Hardware collaborator driving the auto-toggle carrier output.
///
/// Board-supplied: the modulator is an opaque gated oscillator from the
/// PHY's point of view (spec §1); `start`/`stop` gate it on a
/// sub-microsecond boundary that the Tx PHY treats as instantaneous
/// (spec §4.2).
pub trait CarrierModulator {
    /// One-time setup: generator clock in Hz, initial tuning point, and
    /// whether the carrier should already be running after `init`.
    fn init(&self, gclk_hz: u32, freq: CarrierFrequency, start_now: bool);

    /// Enable the underlying timer peripheral (clock gating on), without
    /// necessarily starting output.
    fn enable(&self);

    /// Disable the underlying timer peripheral.
    fn disable(&self);

    /// Gate the carrier on: the output pin begins toggling.
    fn start(&self);

    /// Gate the carrier off: the output pin is held low/high (off).
    fn stop(&self);

    /// Reprogram the tuning point without otherwise disturbing on/off
    /// state.
    fn set_freq(&self, freq: CarrierFrequency);
}
