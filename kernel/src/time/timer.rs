//! Sleep API and wake dispatcher
//!
//! A sleeping thread publishes a [`SleepRecord`] on its own stack and
//! blocks; the tick interrupt scans the registry and hands due threads back
//! to the scheduler. Both sides touch the registry only with interrupts
//! masked.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use super::sleep_queue::{SleepQueue, SleepRecord};
use super::ticks::{real_time_to_ticks, Tick, TickCounter, Ticks};
use crate::arch::{InterruptControl, IntrLevel};
use crate::config::TimerConfig;
use crate::scheduler::ThreadScheduler;
use crate::sync::{IrqCell, IrqGuard};

/// Tick counter, sleep registry and busy-loop calibration of one CPU.
pub struct SleepTimer<'a> {
    config: TimerConfig,
    irq: &'a dyn InterruptControl,
    sched: &'a dyn ThreadScheduler,
    ticks: TickCounter,
    sleepers: IrqCell<RefCell<SleepQueue>>,
    /// Busy-loop iterations per tick, 0 until calibrated
    pub(super) loops_per_tick: AtomicU32,
}

impl<'a> SleepTimer<'a> {
    pub fn new(
        config: TimerConfig,
        irq: &'a dyn InterruptControl,
        sched: &'a dyn ThreadScheduler,
    ) -> Self {
        Self {
            config,
            irq,
            sched,
            ticks: TickCounter::new(),
            sleepers: IrqCell::new(RefCell::new(SleepQueue::new())),
            loops_per_tick: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub(super) fn irq(&self) -> &'a dyn InterruptControl {
        self.irq
    }

    /// Ticks since boot
    pub fn now(&self) -> Tick {
        let guard = IrqGuard::new(self.irq);
        self.ticks.read(&guard)
    }

    /// Ticks elapsed since `then`, a value once returned by [`now`](Self::now)
    pub fn elapsed(&self, then: Tick) -> Ticks {
        self.now() - then
    }

    /// Number of threads currently sleeping
    pub fn sleeping(&self) -> usize {
        let guard = IrqGuard::new(self.irq);
        let len = self.sleepers.borrow(&guard).borrow().len();
        len
    }

    /// Suspend the current thread for at least `duration` ticks.
    ///
    /// Interrupts must be enabled. A non-positive duration returns at once
    /// without blocking. Otherwise the thread is woken on the first tick
    /// whose counter reaches `now() + duration`.
    pub fn sleep_ticks(&self, duration: Ticks) {
        let start = self.now();

        assert_eq!(
            self.irq.level(),
            IntrLevel::On,
            "sleep_ticks called with interrupts disabled"
        );

        if duration <= 0 {
            return;
        }

        let thread = self.sched.current();
        let saved = if self.config.snapshots_feedback() {
            Some(self.sched.feedback(thread))
        } else {
            None
        };
        let record = SleepRecord::new(thread, start.saturating_add(duration), saved);

        log::trace!("{} sleeps until tick {}", thread, record.deadline());

        let guard = IrqGuard::new(self.irq);
        {
            let mut sleepers = self.sleepers.borrow(&guard).borrow_mut();
            // SAFETY: `record` stays on this frame, which cannot return
            // before `block_current` does. That only happens after the
            // dispatcher unlinked the record and reactivated the thread.
            unsafe { sleepers.insert(&record) };
        }
        self.sched.block_current();
        debug_assert!(
            !record.is_queued(),
            "{} resumed before its sleep record was removed",
            thread
        );
        drop(guard);
    }

    /// Sleep for about `num / denom` seconds.
    ///
    /// Requests shorter than a tick busy-wait instead, since the registry
    /// cannot resolve them.
    pub(super) fn real_time_sleep(&self, num: i64, denom: i32) {
        let ticks = real_time_to_ticks(num, denom, self.config.frequency());

        assert_eq!(
            self.irq.level(),
            IntrLevel::On,
            "real-time sleep called with interrupts disabled"
        );

        if ticks > 0 {
            self.sleep_ticks(ticks);
        } else {
            self.real_time_delay(num, denom);
        }
    }

    /// Wake dispatcher, run once per timer interrupt.
    ///
    /// Advances the counter, lets the scheduler do its per-tick accounting,
    /// then reactivates every sleeper whose deadline has been reached,
    /// restoring its feedback state first. Never blocks or allocates.
    pub fn interrupt(&self) {
        // Already masked in interrupt context; this only records it.
        let guard = IrqGuard::new(self.irq);
        let now = self.ticks.advance(&guard);
        self.sched.notify_tick();

        let sched = self.sched;
        self.sleepers
            .borrow(&guard)
            .borrow_mut()
            .wake_expired(now, |thread, saved| {
                if let Some(state) = saved {
                    sched.set_feedback(thread, state);
                }
                sched.reactivate(thread);
            });
    }
}

impl SleepTimer<'_> {
    /// Sleep for approximately `ms` milliseconds. Interrupts must be on.
    pub fn sleep_ms(&self, ms: i64) {
        self.real_time_sleep(ms, super::ticks::MS_PER_SEC);
    }

    /// Sleep for approximately `us` microseconds. Interrupts must be on.
    pub fn sleep_us(&self, us: i64) {
        self.real_time_sleep(us, super::ticks::US_PER_SEC);
    }

    /// Sleep for approximately `ns` nanoseconds. Interrupts must be on.
    pub fn sleep_ns(&self, ns: i64) {
        self.real_time_sleep(ns, super::ticks::NS_PER_SEC);
    }

    /// Busy-wait for approximately `ms` milliseconds.
    ///
    /// Interrupts may be off, but spinning that long with them off loses
    /// ticks; prefer [`sleep_ms`](Self::sleep_ms) when they are on.
    pub fn busy_delay_ms(&self, ms: i64) {
        self.real_time_delay(ms, super::ticks::MS_PER_SEC);
    }

    /// Busy-wait for approximately `us` microseconds.
    pub fn busy_delay_us(&self, us: i64) {
        self.real_time_delay(us, super::ticks::US_PER_SEC);
    }

    /// Busy-wait for approximately `ns` nanoseconds.
    pub fn busy_delay_ns(&self, ns: i64) {
        self.real_time_delay(ns, super::ticks::NS_PER_SEC);
    }

    /// Calibrated busy-loop iterations per tick, 0 before calibration
    pub fn loops_per_tick(&self) -> u32 {
        self.loops_per_tick.load(Ordering::Relaxed)
    }
}
