//! Busy-loop calibration and sub-tick delays
//!
//! The tick is too coarse for short waits, so the timer measures how many
//! iterations of [`busy_wait`] fit in one tick and spins proportionally.

use core::sync::atomic::Ordering;

use super::ticks::Tick;
use super::timer::SleepTimer;
use crate::arch::IntrLevel;
use crate::config::{CALIBRATION_BASELINE, CALIBRATION_REFINE_BITS};

/// Spin for `loops` iterations.
///
/// Never inlined: code alignment changes the cost of an iteration, and the
/// calibrated figure is only valid for this one copy of the loop.
#[inline(never)]
pub fn busy_wait(loops: i64) {
    let mut remaining = loops;
    while remaining > 0 {
        core::hint::spin_loop();
        remaining -= 1;
    }
}

/// Largest loop count that still fits in one tick, as judged by
/// `too_many_loops`.
///
/// Doubles from [`CALIBRATION_BASELINE`] while twice the current count fits,
/// then refines the [`CALIBRATION_REFINE_BITS`] bits under the leading one.
pub fn search_loops_per_tick<F>(mut too_many_loops: F) -> u32
where
    F: FnMut(u32) -> bool,
{
    let mut loops_per_tick = CALIBRATION_BASELINE;
    while !too_many_loops(loops_per_tick << 1) {
        loops_per_tick <<= 1;
        assert_ne!(loops_per_tick, 0, "busy-loop calibration overflowed");
    }

    let high_bit = loops_per_tick;
    let mut test_bit = high_bit >> 1;
    while test_bit != high_bit >> (CALIBRATION_REFINE_BITS + 1) {
        if !too_many_loops(loops_per_tick | test_bit) {
            loops_per_tick |= test_bit;
        }
        test_bit >>= 1;
    }

    loops_per_tick
}

/// Iterations of [`busy_wait`] for `num / denom` seconds.
///
/// Numerator and denominator are scaled down by 1000 to keep the product in
/// range.
pub fn delay_loops(loops_per_tick: u32, num: i64, denom: i32, frequency: u32) -> i64 {
    assert!(denom % 1000 == 0, "delay denominator {} not a multiple of 1000", denom);
    ((loops_per_tick as i64).saturating_mul(num) / 1000).saturating_mul(frequency as i64)
        / (denom / 1000) as i64
}

impl SleepTimer<'_> {
    /// Measure busy-loop iterations per tick.
    ///
    /// Needs a ticking timer, so interrupts must be enabled. Takes a few
    /// dozen ticks.
    pub fn calibrate(&self) -> u32 {
        assert_eq!(
            self.irq().level(),
            IntrLevel::On,
            "calibration needs the tick interrupt enabled"
        );
        log::info!("Calibrating timer...");

        let loops_per_tick = search_loops_per_tick(|loops| self.too_many_loops(loops));
        self.loops_per_tick.store(loops_per_tick, Ordering::Relaxed);

        log::info!(
            "{} loops/s",
            loops_per_tick as u64 * self.config().frequency() as u64
        );
        loops_per_tick
    }

    /// Whether `loops` iterations take more than one tick
    fn too_many_loops(&self, loops: u32) -> bool {
        // Start right after a tick boundary.
        let start = self.now();
        while self.now() == start {
            core::hint::spin_loop();
        }

        let start: Tick = self.now();
        busy_wait(loops as i64);
        start != self.now()
    }

    /// Busy-wait for about `num / denom` seconds.
    pub(super) fn real_time_delay(&self, num: i64, denom: i32) {
        busy_wait(delay_loops(
            self.loops_per_tick(),
            num,
            denom,
            self.config().frequency(),
        ));
    }
}
