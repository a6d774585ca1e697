//! Compile-time sizing and timing constants.
//!
//! Spec §4.4/§6 has no persisted or runtime-loaded configuration — every
//! knob here is fixed at build time, the way Tock capsules take their
//! sizes as `const`s or const generics rather than reading a config file
//! (there is nothing to persist per spec §6, and no allocator to grow a
//! buffer at runtime per spec §1).

/// Both PHY timers run off an 8 MHz generator-clock divided by 64.
pub const USEC_PER_TICK: u32 = 8;

/// Maximum number of descriptors the Tx queue can hold (spec §3).
pub const Q_SZ: usize = 20;

/// Number of capture elements a single Rx buffer can hold (spec §3).
pub const BUF_SZ: usize = 256;

/// Number of Rx capture buffers in the rotating bank (spec §3).
pub const N_BUFS: usize = 4;

/// Sentinel value for "repeat this block forever" (spec §3).
pub const FOREVER: i16 = -1;

/// Rx PHY per-state timer compare values and overflow-tolerance counts
/// (spec §4.6). Expressed in ticks (8 µs each) since that is what gets
/// programmed into the 16-bit compare register.
pub mod rx_timing {
    /// Line must be quiet this long (ticks) to declare `synchronize` done.
    pub const SYNC_DELAY: u16 = 7500; // 60 ms
    /// Per-wrap timer top while MARKING (ticks).
    pub const MARK_DELAY: u16 = 1125; // 9 ms, NEC's longest mark
    /// Per-wrap timer top while SPACING (ticks); the frame-end detector.
    pub const SPACE_DELAY: u16 = 1125; // 9 ms
    /// Wraps of `MARK_DELAY` tolerated before declaring a mark timeout.
    pub const TIMER_OVERFLOWS_MARK: u8 = 1;
    /// Wraps of `SPACE_DELAY` tolerated before declaring frame end.
    pub const TIMER_OVERFLOWS_SPACE: u8 = 1;
}
