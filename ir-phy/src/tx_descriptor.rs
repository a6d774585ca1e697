//! Tx descriptor queue: a bounded array of mark/space descriptors with
//! repeat semantics (spec §3, §4.3).
//!
//! Modeled as an array plus two indices rather than a linked list to
//! keep the ISR side allocation-free (spec §9): the `decrement` field
//! expresses a backward branch in the "program" the ISR executes,
//! rather than requiring a pointer-chasing data structure.

use core::cell::Cell;

use crate::config::{FOREVER, Q_SZ, USEC_PER_TICK};
use crate::status::IrStatus;

/// Which half of the waveform a descriptor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntervalKind {
    Mark,
    Space,
}

/// One entry in the Tx "program" (spec §3).
///
/// `#[derive(Clone, Copy)]` and stored whole in a `Cell`, the way
/// `virtual_alarm.rs` stores its `Cell<TickDtReference<T>>`: every field
/// group that must update atomically from the ISR's point of view is
/// replaced as a single `Cell::set` of the whole struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Descriptor {
    pub interval_kind: IntervalKind,
    /// Nominal duration in microseconds, as requested by the caller.
    pub usec: u16,
    /// `usec mod 2048 / usec_per_tick`, the low 8 bits of the tick count
    /// within one counter rollover — what actually gets programmed into
    /// the 8-bit Tx timer's compare register.
    pub period: u8,
    /// Full-counter rollovers preceding the final partial period.
    /// Computed but not yet consulted by the ISR (spec §9 Open
    /// Question): multi-wrap Tx intervals currently truncate to
    /// `usec mod 2048 µs`.
    pub overflows: u8,
    pub repeat_cnt: i16,
    pub max_repeat_cnt: i16,
    /// How far back in the queue a repeat rewinds, clamped at fill time
    /// so it cannot point before slot 0.
    pub decrement: u8,
}

impl Descriptor {
    fn new(kind: IntervalKind, usec: u16, max_repeat: i16, decrement: u8) -> Self {
        let usec = usec as u32;
        Descriptor {
            interval_kind: kind,
            usec: usec as u16,
            // Tracks spec §4.3's "usec mod (UINT8_MAX+1) / usec_per_tick
            // within one counter rollover" (2048 = 256 * USEC_PER_TICK),
            // not the original C's `usec % 256`; the two disagree and
            // the divergence is deliberate, not an oversight.
            period: ((usec % 2048) / USEC_PER_TICK) as u8,
            overflows: (usec / 256) as u8,
            repeat_cnt: 0,
            max_repeat_cnt: if max_repeat < 0 { FOREVER } else { max_repeat },
            decrement,
        }
    }
}

/// Bounded, allocation-free producer/consumer queue of [`Descriptor`]s
/// (spec §3, §4.3).
///
/// Invariants (spec §8 invariant 1): `0 <= tx_index <= fill_index <=
/// Q_SZ` at all times.
pub struct TxQueue {
    slots: [Cell<Descriptor>; Q_SZ],
    fill_index: Cell<usize>,
    tx_index: Cell<usize>,
}

impl TxQueue {
    const EMPTY: Descriptor = Descriptor {
        interval_kind: IntervalKind::Space,
        usec: 0,
        period: 0,
        overflows: 0,
        repeat_cnt: 0,
        max_repeat_cnt: 0,
        decrement: 0,
    };

    pub const fn new() -> Self {
        const EMPTY_SLOT: Cell<Descriptor> = Cell::new(TxQueue::EMPTY);
        TxQueue {
            slots: [EMPTY_SLOT; Q_SZ],
            fill_index: Cell::new(0),
            tx_index: Cell::new(0),
        }
    }

    /// Current producer index (tests / diagnostics only).
    pub fn fill_index(&self) -> usize {
        self.fill_index.get()
    }

    /// Current consumer index (tests / diagnostics only).
    pub fn tx_index(&self) -> usize {
        self.tx_index.get()
    }

    /// Append a descriptor (spec §4.3 `fill`).
    ///
    /// Caller (the Tx PHY) is responsible for rejecting this while
    /// `tx_in_progress`; the queue itself has no notion of that flag.
    pub fn fill(
        &self,
        reset: bool,
        kind: IntervalKind,
        usec: u16,
        max_repeat: i16,
        decrement: u8,
    ) -> Result<(), IrStatus> {
        if reset {
            self.fill_index.set(0);
            self.tx_index.set(0);
        }

        let index = self.fill_index.get();
        if index == Q_SZ {
            return Err(IrStatus::Overflow);
        }

        // A rewind cannot land before slot 0: clamp decrements that
        // would point past the current slot's ordinal position + 1.
        let max_decrement = (index + 1) as u8;
        let decrement = if decrement > max_decrement {
            0
        } else {
            decrement
        };

        self.slots[index].set(Descriptor::new(kind, usec, max_repeat, decrement));
        self.fill_index.set(index + 1);
        Ok(())
    }

    /// Consume the next descriptor (spec §4.3 `get`).
    pub fn get(&self) -> Result<Descriptor, IrStatus> {
        let index = self.tx_index.get();
        if index < self.fill_index.get() {
            self.tx_index.set(index + 1);
            Ok(self.slots[index].get())
        } else {
            Err(IrStatus::BadData)
        }
    }

    /// Saturating rewind of the consumer index (spec §4.3
    /// `decrement_tx_index`).
    pub fn decrement_tx_index(&self, n: u8) {
        let index = self.tx_index.get();
        self.tx_index.set(index.saturating_sub(n as usize));
    }

    /// Overwrite the descriptor at `tx_index - 1` (the one just
    /// consumed by `get`) in place. Used by the Tx PHY overflow
    /// callback to persist `repeat_cnt` increments back into the slot
    /// the rewind will revisit.
    pub fn update_last(&self, descriptor: Descriptor) {
        let index = self.tx_index.get();
        if index > 0 {
            self.slots[index - 1].set(descriptor);
        }
    }
}

impl Default for TxQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_get_in_order() {
        let q = TxQueue::new();
        q.fill(true, IntervalKind::Mark, 9000, 0, 0).unwrap();
        q.fill(false, IntervalKind::Space, 4500, 0, 0).unwrap();
        assert_eq!(q.fill_index(), 2);

        let d0 = q.get().unwrap();
        assert_eq!(d0.interval_kind, IntervalKind::Mark);
        assert_eq!(d0.period, 1125 % 256);

        let d1 = q.get().unwrap();
        assert_eq!(d1.interval_kind, IntervalKind::Space);

        assert_eq!(q.get(), Err(IrStatus::BadData));
    }

    #[test]
    fn overflow_at_q_sz() {
        let q = TxQueue::new();
        for i in 0..Q_SZ {
            q.fill(i == 0, IntervalKind::Mark, 100, 0, 0).unwrap();
        }
        assert_eq!(q.fill_index(), Q_SZ);
        assert_eq!(
            q.fill(false, IntervalKind::Mark, 100, 0, 0),
            Err(IrStatus::Overflow)
        );
    }

    #[test]
    fn decrement_is_clamped_at_fill_time() {
        let q = TxQueue::new();
        q.fill(true, IntervalKind::Mark, 560, 0, 0).unwrap();
        // Slot 1 is being filled; a decrement of 5 would land before
        // slot 0 and must be coerced to 0.
        q.fill(false, IntervalKind::Space, 560, 2, 5).unwrap();
        let d1 = {
            q.get().unwrap();
            q.get().unwrap()
        };
        assert_eq!(d1.decrement, 0);
    }

    #[test]
    fn decrement_tx_index_saturates() {
        let q = TxQueue::new();
        q.fill(true, IntervalKind::Mark, 100, 0, 0).unwrap();
        q.get().unwrap();
        q.decrement_tx_index(5);
        assert_eq!(q.tx_index(), 0);
    }
}
