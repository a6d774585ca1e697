//! Rx capture buffers: a rotating bank of fixed-size capture-element
//! arrays with producer (ISR) / consumer (foreground) handoff (spec §3,
//! §4.5).
//!
//! Buffer `state` is the synchronization boundary described in spec
//! §5: the writer (ISR) completes every element write to a buffer
//! before flipping `state` from `Empty` to `Full`, so the foreground
//! may read a `Full` buffer's contents without further synchronization
//! once it observes the flip. No lock is needed for that half of the
//! handoff; the reverse direction (`Full` -> `Empty`) is owned entirely
//! by the foreground and never touched from the ISR.

use core::cell::Cell;

use crate::config::{BUF_SZ, N_BUFS};
use crate::status::IrStatus;

/// Logic level the Rx capture element describes (spec §3).
///
/// Matches the inverted-output convention of commodity IR demodulators:
/// `Mark` (LED modulating) reads as line LOW, `Space` as line HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum GpioState {
    Mark,
    Space,
    Uninitialized,
}

/// One captured mark/space duration (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CaptureElement {
    pub gpio_state: GpioState,
    /// Duration in counter ticks, including any full-counter rollovers
    /// accumulated while MARKING.
    pub ticks: u32,
    /// `ticks * usec_per_tick`.
    pub time_us: u32,
}

impl CaptureElement {
    const UNINITIALIZED: CaptureElement = CaptureElement {
        gpio_state: GpioState::Uninitialized,
        ticks: 0,
        time_us: 0,
    };
}

/// Whether a buffer is writable by the ISR or awaiting consumption by
/// the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BufState {
    Empty,
    Full,
}

/// One fixed-size capture buffer (spec §3 `B`).
pub struct RxBuffer {
    status: Cell<IrStatus>,
    size: Cell<usize>,
    state: Cell<BufState>,
    elem: [Cell<CaptureElement>; BUF_SZ],
}

impl RxBuffer {
    const fn new() -> Self {
        const UNINIT_ELEM: Cell<CaptureElement> = Cell::new(CaptureElement::UNINITIALIZED);
        RxBuffer {
            status: Cell::new(IrStatus::Ok),
            size: Cell::new(0),
            state: Cell::new(BufState::Empty),
            elem: [UNINIT_ELEM; BUF_SZ],
        }
    }

    /// Reset this buffer to its writable, empty state (spec §4.5
    /// `reset`, the per-buffer half).
    fn reset(&self) {
        self.state.set(BufState::Empty);
        self.status.set(IrStatus::Ok);
        self.size.set(0);
        for e in self.elem.iter() {
            e.set(CaptureElement::UNINITIALIZED);
        }
    }

    pub fn status(&self) -> IrStatus {
        self.status.get()
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    pub fn state(&self) -> BufState {
        self.state.get()
    }

    /// Read element `i` (`0 <= i < size()`). Foreground-only; the
    /// caller must have already observed `state() == Full`.
    pub fn elem(&self, i: usize) -> CaptureElement {
        self.elem[i].get()
    }

    /// Foreground-side drain: clear `size` and flip back to `Empty`
    /// once this buffer's contents have been consumed (spec §6's
    /// transition protocol).
    pub fn consume(&self) {
        self.size.set(0);
        self.state.set(BufState::Empty);
    }
}

/// Fixed ring of [`RxBuffer`]s plus the ISR's current-buffer index
/// (spec §3 "Rx buffer bank").
pub struct RxBufferBank {
    buffers: [RxBuffer; N_BUFS],
    idx_isr: Cell<usize>,
    overflows: Cell<u32>,
    no_memory: Cell<u32>,
}

impl RxBufferBank {
    pub const fn new() -> Self {
        const EMPTY_BUF: RxBuffer = RxBuffer::new();
        RxBufferBank {
            buffers: [EMPTY_BUF; N_BUFS],
            idx_isr: Cell::new(0),
            overflows: Cell::new(0),
            no_memory: Cell::new(0),
        }
    }

    /// Reset a single buffer by index (spec §4.5 `reset`).
    pub fn reset(&self, idx: usize) -> Result<(), IrStatus> {
        let buf = self.buffers.get(idx).ok_or(IrStatus::NoMemory)?;
        buf.reset();
        Ok(())
    }

    /// Reset every buffer, zero error counters, and rewind the ISR
    /// index to 0 (spec §4.5 `init`).
    pub fn init(&self) {
        for buf in self.buffers.iter() {
            buf.reset();
        }
        self.idx_isr.set(0);
        self.overflows.set(0);
        self.no_memory.set(0);
    }

    /// Access a buffer for foreground draining (consumer API, spec
    /// §6). Returns `None` for an out-of-range index.
    pub fn buffer(&self, idx: usize) -> Option<&RxBuffer> {
        self.buffers.get(idx)
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflows.get()
    }

    pub fn no_memory_count(&self) -> u32 {
        self.no_memory.get()
    }

    /// Index of the buffer the ISR currently writes into.
    pub fn idx_isr(&self) -> usize {
        self.idx_isr.get()
    }

    fn current(&self) -> &RxBuffer {
        &self.buffers[self.idx_isr.get()]
    }

    /// ISR-only: reserve the next writable element slot in the current
    /// buffer (spec §4.5 `acquire_elem`).
    ///
    /// Writes the returned status into the buffer's `status` field
    /// regardless of outcome, per spec §4.5.
    pub fn acquire_elem(&self, element: CaptureElement) -> Result<(), IrStatus> {
        let buf = self.current();

        if buf.state.get() != BufState::Empty {
            self.no_memory.set(self.no_memory.get() + 1);
            buf.status.set(IrStatus::NoMemory);
            return Err(IrStatus::NoMemory);
        }

        let size = buf.size.get();
        if size == BUF_SZ {
            self.overflows.set(self.overflows.get() + 1);
            buf.status.set(IrStatus::Overflow);
            return Err(IrStatus::Overflow);
        }

        buf.elem[size].set(element);
        buf.size.set(size + 1);
        buf.status.set(IrStatus::Ok);
        Ok(())
    }

    /// ISR-only: close out the current buffer and rotate to the next
    /// one (spec §4.5 `complete`).
    pub fn complete(&self, final_status: IrStatus) {
        let buf = self.current();
        buf.state.set(BufState::Full);
        buf.status.set(final_status);
        self.idx_isr.set((self.idx_isr.get() + 1) % N_BUFS);
    }

    /// `true` if the buffer the ISR will next write into (i.e. the
    /// buffer `idx_isr` already points at, after a prior `complete`'s
    /// rotation) is currently `Empty`. Used by `handle_overflow` to
    /// detect the rare compound case where an element-array overflow
    /// coincides with every other buffer already being full.
    pub fn next_is_empty(&self) -> bool {
        self.buffers[self.idx_isr.get()].state.get() == BufState::Empty
    }
}

impl Default for RxBufferBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_resets_everything() {
        let bank = RxBufferBank::new();
        bank.acquire_elem(CaptureElement {
            gpio_state: GpioState::Mark,
            ticks: 10,
            time_us: 80,
        })
        .unwrap();
        bank.complete(IrStatus::Ok);
        bank.init();
        assert_eq!(bank.idx_isr(), 0);
        assert_eq!(bank.overflow_count(), 0);
        assert_eq!(bank.no_memory_count(), 0);
        assert_eq!(bank.buffer(0).unwrap().state(), BufState::Empty);
    }

    #[test]
    fn acquire_and_complete_rotates_buffers() {
        let bank = RxBufferBank::new();
        bank.acquire_elem(CaptureElement {
            gpio_state: GpioState::Mark,
            ticks: 10,
            time_us: 80,
        })
        .unwrap();
        assert_eq!(bank.buffer(0).unwrap().size(), 1);
        bank.complete(IrStatus::Ok);
        assert_eq!(bank.buffer(0).unwrap().state(), BufState::Full);
        assert_eq!(bank.idx_isr(), 1);
    }

    #[test]
    fn element_exhaustion_reports_overflow() {
        let bank = RxBufferBank::new();
        for _ in 0..BUF_SZ {
            bank.acquire_elem(CaptureElement {
                gpio_state: GpioState::Mark,
                ticks: 1,
                time_us: 8,
            })
            .unwrap();
        }
        let err = bank.acquire_elem(CaptureElement {
            gpio_state: GpioState::Mark,
            ticks: 1,
            time_us: 8,
        });
        assert_eq!(err, Err(IrStatus::Overflow));
        assert_eq!(bank.overflow_count(), 1);
    }

    #[test]
    fn buffer_exhaustion_reports_no_memory() {
        let bank = RxBufferBank::new();
        for _ in 0..N_BUFS {
            bank.acquire_elem(CaptureElement {
                gpio_state: GpioState::Mark,
                ticks: 1,
                time_us: 8,
            })
            .unwrap();
            bank.complete(IrStatus::Ok);
        }
        // All N_BUFS buffers are now Full; idx_isr wrapped back to 0.
        let err = bank.acquire_elem(CaptureElement {
            gpio_state: GpioState::Mark,
            ticks: 1,
            time_us: 8,
        });
        assert_eq!(err, Err(IrStatus::NoMemory));
        assert_eq!(bank.no_memory_count(), 1);
    }

    #[test]
    fn foreground_consume_makes_buffer_writable_again() {
        let bank = RxBufferBank::new();
        bank.acquire_elem(CaptureElement {
            gpio_state: GpioState::Space,
            ticks: 5,
            time_us: 40,
        })
        .unwrap();
        bank.complete(IrStatus::Ok);
        let buf = bank.buffer(0).unwrap();
        assert_eq!(buf.state(), BufState::Full);
        buf.consume();
        assert_eq!(buf.state(), BufState::Empty);
        assert_eq!(buf.size(), 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let bank = RxBufferBank::new();
        bank.reset(0).unwrap();
        bank.reset(0).unwrap();
        assert_eq!(bank.buffer(0).unwrap().state(), BufState::Empty);
    }
}
