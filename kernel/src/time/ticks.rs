//! Tick counter and real-time conversion

use core::cell::Cell;

use crate::sync::{IrqCell, IrqGuard};

/// Absolute tick value, counted from boot
pub type Tick = i64;

/// Tick interval
pub type Ticks = i64;

pub const MS_PER_SEC: i32 = 1_000;
pub const US_PER_SEC: i32 = 1_000_000;
pub const NS_PER_SEC: i32 = 1_000_000_000;

/// Monotonic count of timer interrupts since boot.
///
/// Written only by the tick handler. A 64-bit value is not a single atomic
/// word everywhere, so reads also go through the critical section.
pub struct TickCounter {
    value: IrqCell<Cell<Tick>>,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            value: IrqCell::new(Cell::new(0)),
        }
    }

    #[inline]
    pub fn read(&self, guard: &IrqGuard<'_>) -> Tick {
        self.value.borrow(guard).get()
    }

    /// Count one interrupt, returning the new value
    #[inline]
    pub fn advance(&self, guard: &IrqGuard<'_>) -> Tick {
        let value = self.value.borrow(guard);
        let next = value.get() + 1;
        value.set(next);
        next
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `num / denom` seconds into ticks, rounding toward zero.
///
/// ```text
///     (num / denom) s
///  ---------------------  = num * frequency / denom ticks
///  1 s / frequency ticks
/// ```
///
/// Computed in 128 bits and clamped, so oversized requests saturate.
pub fn real_time_to_ticks(num: i64, denom: i32, frequency: u32) -> Ticks {
    let ticks = num as i128 * frequency as i128 / denom as i128;
    ticks.clamp(i64::MIN as i128, i64::MAX as i128) as Ticks
}
