//! Rx PHY state machine: an edge-plus-timeout state machine capturing
//! mark/space durations into a rotating set of fixed-size buffers, with
//! explicit resynchronization after framing errors or buffer exhaustion
//! (spec §4.6).
//!
//! The edge-interrupt handling is modeled on `capsules/src/gpio.rs`'s
//! `ClientWithValue::fired`: a single bi-edge IRQ line carries no
//! edge-direction payload of its own, so [`RxPhy::fired`] recovers which
//! edge fired by reading the pin's level from inside the callback.

use core::cell::Cell;

use ir_hil::gpio;
use ir_hil::time::{CounterTimer, OverflowClient};

use crate::config::rx_timing::{
    MARK_DELAY, SPACE_DELAY, SYNC_DELAY, TIMER_OVERFLOWS_MARK, TIMER_OVERFLOWS_SPACE,
};
use crate::config::USEC_PER_TICK;
use crate::rx_buffer::{CaptureElement, GpioState, RxBuffer, RxBufferBank};
use crate::status::IrStatus;

/// The four states spec §3/§4.6 name, plus the initial `synchronize`
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum RxState {
    Synchronize,
    Idle,
    Marking,
    Spacing,
}

/// The three event kinds the Rx state machine dispatches on (spec
/// §4.6 "Events").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum RxEvent {
    RisingEdge,
    FallingEdge,
    Timeout,
}

/// Per-state timer-overflow counters (spec §3 `S`).
#[derive(Default)]
struct OverflowCounters {
    idle: Cell<u8>,
    mark: Cell<u8>,
    space: Cell<u8>,
}

/// Foreground-visible error statistics (spec §4.6/§7): never propagated
/// synchronously, only ever incremented.
#[derive(Default)]
pub struct RxStats {
    resyncs: Cell<u32>,
    buffer_overflows: Cell<u32>,
}

impl RxStats {
    pub fn resyncs(&self) -> u32 {
        self.resyncs.get()
    }

    pub fn buffer_overflows(&self) -> u32 {
        self.buffer_overflows.get()
    }
}

/// Owns the Rx 16-bit timer, the bi-edge interrupt pin, and the capture
/// buffer bank, and drives the `{synchronize, idle, marking, spacing}`
/// state machine from §4.6.
pub struct RxPhy<'a, T, P>
where
    T: CounterTimer<'a, Width = u16>,
    P: gpio::InterruptPin<'a>,
{
    timer: &'a T,
    pin: &'a P,
    state: Cell<RxState>,
    overflows: OverflowCounters,
    bank: RxBufferBank,
    stats: RxStats,
}

impl<'a, T, P> RxPhy<'a, T, P>
where
    T: CounterTimer<'a, Width = u16>,
    P: gpio::InterruptPin<'a>,
{
    pub fn new(timer: &'a T, pin: &'a P) -> Self {
        RxPhy {
            timer,
            pin,
            state: Cell::new(RxState::Synchronize),
            overflows: OverflowCounters::default(),
            bank: RxBufferBank::new(),
            stats: RxStats::default(),
        }
    }

    /// Register this PHY as the timer's overflow client and the pin's
    /// interrupt client. Board bring-up calls this once; kept separate
    /// from [`Self::enable`] since it needs the `'a`-bounded `&self`
    /// reference a board's `static_init!`-style singleton provides.
    pub fn set_clients(&'a self) {
        self.pin.set_client(self);
        let _ = self.timer.set_overflow_client(self);
    }

    /// Reset everything to its power-on state (spec §6 `rx_phy_init`).
    /// Idempotent: calling this twice in a row is equivalent to once.
    pub fn init(&self) {
        self.bank.init();
        self.overflows.idle.set(0);
        self.overflows.mark.set(0);
        self.overflows.space.set(0);
        self.stats.resyncs.set(0);
        self.stats.buffer_overflows.set(0);
        self.state.set(RxState::Synchronize);
    }

    /// Arm the input pin and start the synchronize watchdog (spec §6
    /// `rx_phy_enable`).
    pub fn enable(&self) {
        self.pin.make_input();
        self.pin.set_floating_state(gpio::FloatingState::PullUp);
        let _ = self.pin.enable_interrupts(gpio::InterruptEdge::EitherEdge);
        self.timer.stop();
        self.timer.restart(SYNC_DELAY);
        self.state.set(RxState::Synchronize);
    }

    /// Disarm the input pin and stop the timer (spec §6
    /// `rx_phy_disable`). Discards any in-flight frame (spec §5
    /// "cancellation is implicit").
    pub fn disable(&self) {
        self.pin.disable_interrupts();
        self.timer.stop();
    }

    /// Force a resynchronize from the foreground (spec §6
    /// `rx_phy_reset`).
    pub fn reset(&self) {
        self.handle_resync();
    }

    /// Current state (tests / diagnostics only).
    pub fn state(&self) -> RxState {
        self.state.get()
    }

    pub fn stats(&self) -> &RxStats {
        &self.stats
    }

    /// Access a capture buffer for foreground draining (spec §6
    /// `rx_buf_init`/direct-field-read consumer API). The foreground
    /// reads fields directly, then calls [`RxBuffer::consume`] once
    /// done.
    pub fn buffer(&self, idx: usize) -> Option<&RxBuffer> {
        self.bank.buffer(idx)
    }

    /// Reset a single buffer by index (spec §6 `rx_buf_reset`).
    pub fn buf_reset(&self, idx: usize) -> Result<(), IrStatus> {
        self.bank.reset(idx)
    }

    /// Reset the whole buffer bank (spec §6 `rx_buf_init`).
    pub fn buf_init(&self) {
        self.bank.init();
    }

    pub fn overflow_count(&self) -> u32 {
        self.bank.overflow_count()
    }

    pub fn no_memory_count(&self) -> u32 {
        self.bank.no_memory_count()
    }

    pub fn idle_overflow_count(&self) -> u8 {
        self.overflows.idle.get()
    }

    /// Route one event through the state machine (spec §4.6 "State
    /// transitions"). Called from [`Self::fired`] for edges and
    /// [`OverflowClient::overflow`] for timeouts.
    fn handle_event(&self, event: RxEvent) {
        match self.state.get() {
            RxState::Synchronize => self.on_synchronize(event),
            RxState::Idle => self.on_idle(event),
            RxState::Marking => self.on_marking(event),
            RxState::Spacing => self.on_spacing(event),
        }
    }

    fn on_synchronize(&self, event: RxEvent) {
        match event {
            RxEvent::Timeout => {
                let count: u32 = self.timer.read_count().into();
                self.timer.stop();
                if count > SYNC_DELAY as u32 {
                    self.state.set(RxState::Idle);
                } else {
                    self.timer.restart(SYNC_DELAY);
                }
            }
            // Any activity on the line means the bus is not yet idle:
            // restart the sync watchdog (spec §4.6, §9 notes there is
            // no maximum resync budget).
            RxEvent::RisingEdge | RxEvent::FallingEdge => {
                self.timer.stop();
                self.timer.restart(SYNC_DELAY);
            }
        }
    }

    fn on_idle(&self, event: RxEvent) {
        match event {
            RxEvent::FallingEdge => {
                self.timer.stop();
                self.timer.restart(MARK_DELAY);
                self.state.set(RxState::Marking);
            }
            // Should never happen with no timer running; diagnostic
            // counter only (spec §4.6).
            RxEvent::Timeout => {
                self.overflows.idle.set(self.overflows.idle.get().wrapping_add(1));
            }
            // A rising edge with no mark in progress is a line glitch,
            // not a framing error: stay in `idle` and wait for the next
            // falling edge, same as `handle_state_idle` in the original.
            RxEvent::RisingEdge => {}
        }
    }

    fn on_marking(&self, event: RxEvent) {
        match event {
            RxEvent::RisingEdge => {
                let count: u32 = self.timer.read_count().into();
                self.timer.stop();
                let ticks = count + (MARK_DELAY as u32) * (self.overflows.mark.get() as u32);
                self.overflows.mark.set(0);
                match self.acquire(GpioState::Mark, ticks) {
                    Ok(()) => {
                        self.timer.restart(SPACE_DELAY);
                        self.state.set(RxState::Spacing);
                    }
                    Err(IrStatus::Overflow) => self.handle_overflow(),
                    Err(_) => self.handle_resync(),
                }
            }
            RxEvent::Timeout => {
                if self.overflows.mark.get() == TIMER_OVERFLOWS_MARK {
                    self.overflows.mark.set(0);
                    self.handle_rx_complete(IrStatus::Timeout);
                } else {
                    self.overflows.mark.set(self.overflows.mark.get() + 1);
                    self.timer.restart(MARK_DELAY);
                }
            }
            // A second falling edge without an intervening rising edge
            // is a glitch on an already-marking line: ignore it and
            // keep timing the current mark, matching the original.
            RxEvent::FallingEdge => {}
        }
    }

    fn on_spacing(&self, event: RxEvent) {
        match event {
            RxEvent::FallingEdge => {
                let count: u32 = self.timer.read_count().into();
                self.timer.stop();
                match self.acquire(GpioState::Space, count) {
                    Ok(()) => {
                        self.timer.restart(MARK_DELAY);
                        self.state.set(RxState::Marking);
                    }
                    Err(IrStatus::Overflow) => self.handle_overflow(),
                    Err(_) => self.handle_resync(),
                }
            }
            RxEvent::Timeout => {
                if self.overflows.space.get() == TIMER_OVERFLOWS_SPACE {
                    self.overflows.space.set(0);
                    self.handle_rx_complete(IrStatus::Ok);
                } else {
                    self.overflows.space.set(self.overflows.space.get() + 1);
                    self.timer.restart(SPACE_DELAY);
                }
            }
            // A rising edge without an intervening falling edge is a
            // glitch on an already-spacing line: ignore it and keep
            // timing the current space, matching the original.
            RxEvent::RisingEdge => {}
        }
    }

    fn acquire(&self, gpio_state: GpioState, ticks: u32) -> Result<(), IrStatus> {
        self.bank.acquire_elem(CaptureElement {
            gpio_state,
            ticks,
            time_us: ticks * USEC_PER_TICK,
        })
    }

    /// Spec §4.6 `handle_rx_complete`: normal frame-end or mark-timeout
    /// path. `complete` cannot itself fail (spec §4.5 defines it as
    /// always `ok`); buffer-bank exhaustion is instead discovered by
    /// the *next* frame's first `acquire_elem` call, which reports
    /// `no_memory` and resyncs directly (see DESIGN.md).
    fn handle_rx_complete(&self, status: IrStatus) {
        self.bank.complete(status);
        self.state.set(RxState::Idle);
    }

    /// Spec §4.6 `handle_overflow`: the current buffer's element array
    /// is full. Close it out as `Overflow` and either continue into
    /// `idle` or, if no buffer is free for the next frame, count it and
    /// resync.
    fn handle_overflow(&self) {
        self.bank.complete(IrStatus::Overflow);
        if self.bank.next_is_empty() {
            self.state.set(RxState::Idle);
        } else {
            self.stats.buffer_overflows.set(self.stats.buffer_overflows.get() + 1);
            self.handle_resync();
        }
    }

    /// Spec §4.6 `handle_resync`: return to `synchronize` and start the
    /// quiet-line watchdog.
    fn handle_resync(&self) {
        self.state.set(RxState::Synchronize);
        self.timer.stop();
        self.timer.restart(SYNC_DELAY);
        self.stats.resyncs.set(self.stats.resyncs.get() + 1);
    }
}

impl<'a, T, P> OverflowClient for RxPhy<'a, T, P>
where
    T: CounterTimer<'a, Width = u16>,
    P: gpio::InterruptPin<'a>,
{
    fn overflow(&self) {
        self.handle_event(RxEvent::Timeout);
    }
}

impl<'a, T, P> gpio::Client for RxPhy<'a, T, P>
where
    T: CounterTimer<'a, Width = u16>,
    P: gpio::InterruptPin<'a>,
{
    /// A bi-edge IRQ carries no edge-direction payload of its own:
    /// recover which edge fired by reading the pin's level now, the
    /// way `capsules/src/gpio.rs`'s `ClientWithValue::fired` recovers
    /// `pin_state` for its upcall. Per the glossary, the line reads
    /// LOW for mark (carrier on) and HIGH for space, so a HIGH reading
    /// here means the line just rose.
    fn fired(&self) {
        let event = if self.pin.read() {
            RxEvent::RisingEdge
        } else {
            RxEvent::FallingEdge
        };
        self.handle_event(event);
    }
}
