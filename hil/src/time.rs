//! Counter-timer vocabulary: the slice of `kernel::hil::time` this crate
//! needs, trimmed to the raw compare/overflow primitive both PHYs sit on
//! top of (no tick-duration math, no `Frequency`/`Ticks` conversions —
//! this is below Tock's `Alarm` abstraction, closer to the bare counter
//! `Alarm` itself is built from).

use crate::ErrorCode;

/// Receives the single callback a [`CounterTimer`] fires on compare
/// match / counter overflow.
///
/// Mirrors `kernel::hil::time::AlarmClient`, but with no ticks payload:
/// spec §4.1 treats the callback as a bare edge, and both PHY state
/// machines recover any timing they need from `read_count()` taken
/// before calling `stop()`.
pub trait OverflowClient {
    /// Called from interrupt context when the counter reaches its
    /// programmed compare/top value.
    fn overflow(&self);
}

/// A single-owner hardware up-counter with a compare/top register and an
/// overflow callback.
///
/// Scoped down from `kernel::hil::time::Alarm`/`Timer` to exactly the
/// operations spec §4.1 lists: `init`, `reset`, `start`, `restart`,
/// `stop`, `read_count`. `Width` is `u8` for the Tx PHY's 8-bit counter
/// and `u16` for the Rx PHY's 16-bit counter.
pub trait CounterTimer<'a> {
    /// The counter's native word size.
    type Width: Copy + Clone + PartialOrd + PartialEq + Into<u32>;

    /// One-time peripheral setup (clock source, prescaler). Never fails:
    /// spec §4.1 treats this abstraction as pure register programming.
    fn init(&self);

    /// Stop the counter and clear it to zero without altering the
    /// programmed compare value.
    fn reset(&self);

    /// Program `compare` as the counter's top/compare value and start
    /// counting from zero.
    fn start(&self, compare: Self::Width);

    /// Stop, reprogram the compare value, and start again from zero.
    /// Equivalent to `stop()` followed by `start(compare)`, exposed as
    /// one call because both PHY ISRs always do this pair together.
    fn restart(&self, compare: Self::Width);

    /// Stop counting. The counter retains its last value until the next
    /// `start`/`restart`/`reset`.
    fn stop(&self);

    /// Read the live counter value without stopping it.
    fn read_count(&self) -> Self::Width;

    /// Register the single client notified on overflow/compare-match.
    fn set_overflow_client(&self, client: &'a dyn OverflowClient) -> Result<(), ErrorCode>;
}
