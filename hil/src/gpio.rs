//! GPIO vocabulary for the Rx PHY's edge-interrupt input.
//!
//! Scoped down from `kernel::hil::gpio` (`Configure`, `Input`,
//! `InterruptPin`, `Client`) to the one pin role spec §6 actually
//! names: a bi-edge external interrupt with an internal pull-up, fed by
//! the IR demodulator output.

use crate::ErrorCode;

/// Internal resistor configuration for an input pin.
///
/// Mirrors `kernel::hil::gpio::FloatingState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingState {
    PullUp,
    PullDown,
    PullNone,
}

/// Which edge(s) a pin should raise an interrupt on.
///
/// Mirrors `kernel::hil::gpio::InterruptEdge`. Spec §6 only ever
/// configures `EitherEdge`, but the other two variants are kept for
/// completeness and board-level test fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptEdge {
    RisingEdge,
    FallingEdge,
    EitherEdge,
}

/// Read-only access to a pin's current logic level.
pub trait Input {
    /// `true` if the pin currently reads HIGH.
    fn read(&self) -> bool;
}

/// Direction/bias configuration for a pin used as a digital input.
pub trait Configure {
    /// Configure the pin as an input.
    fn make_input(&self);

    /// Select the pin's internal pull resistor.
    fn set_floating_state(&self, state: FloatingState);
}

/// Notified when a pin configured for interrupts fires.
///
/// Mirrors `kernel::hil::gpio::ClientWithValue::fired`: the callback
/// carries no edge-direction payload of its own. A bi-edge line looks
/// identical from either direction at the interrupt controller, so the
/// client recovers which edge fired by reading [`Input::read`] from
/// inside `fired` (capsules/src/gpio.rs does the same thing to recover
/// `pin_state` for its upcall).
pub trait Client {
    fn fired(&self);
}

/// A GPIO pin usable as the Rx PHY's bi-edge external-interrupt input.
pub trait InterruptPin<'a>: Input + Configure {
    /// Register the single client notified on interrupt.
    fn set_client(&self, client: &'a dyn Client);

    /// Arm the pin's interrupt for the given edge(s).
    fn enable_interrupts(&self, edge: InterruptEdge) -> Result<(), ErrorCode>;

    /// Disarm the pin's interrupt. Does not change direction/bias.
    fn disable_interrupts(&self);

    /// `true` if this pin's interrupt is currently the one pending at
    /// the controller (useful for shared-vector boards; the PHY itself
    /// never needs this).
    fn is_pending(&self) -> bool;
}
