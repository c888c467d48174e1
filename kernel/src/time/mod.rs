//! Time management subsystem
//!
//! Tick counter, thread sleep and busy delays. One [`SleepTimer`] per
//! kernel is installed by [`init`] before interrupts are enabled and lives
//! until shutdown; the free functions below forward to it.

pub mod calibrate;
pub mod sleep_queue;
pub mod ticks;
pub mod timer;

// Re-exports
pub use calibrate::{busy_wait, delay_loops, search_loops_per_tick};
pub use sleep_queue::{SleepQueue, SleepRecord};
pub use ticks::{real_time_to_ticks, Tick, TickCounter, Ticks};
pub use timer::SleepTimer;

use spin::Once;

use crate::arch::{InterruptControl, TickSource};
use crate::config::TimerConfig;
use crate::error::{TimerError, TimerResult};
use crate::scheduler::ThreadScheduler;

/// Global timer
static TIMER: Once<SleepTimer<'static>> = Once::new();

/// Initialize time subsystem
///
/// Must run exactly once, before interrupts are enabled. Registers
/// [`timer_interrupt`] with `source` at the configured frequency.
pub fn init(
    config: TimerConfig,
    irq: &'static dyn InterruptControl,
    sched: &'static dyn ThreadScheduler,
    source: &dyn TickSource,
) -> TimerResult<()> {
    let mut installed = false;
    TIMER.call_once(|| {
        installed = true;
        SleepTimer::new(config, irq, sched)
    });
    if !installed {
        return Err(TimerError::AlreadyInitialized);
    }

    source.start_periodic(config.frequency(), timer_interrupt);
    log::info!(
        "Timer: {} Hz, {:?} scheduling",
        config.frequency(),
        config.mode()
    );
    Ok(())
}

/// Tick interrupt handler
///
/// Ticks arriving before [`init`] finished are dropped.
pub fn timer_interrupt() {
    if let Some(timer) = TIMER.get() {
        timer.interrupt();
    }
}

fn timer() -> &'static SleepTimer<'static> {
    TIMER.get().expect("Time subsystem not initialized")
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    TIMER.is_completed()
}

/// Calibrate busy delays; interrupts must be on
pub fn calibrate() -> u32 {
    timer().calibrate()
}

/// Ticks since boot
pub fn now() -> Tick {
    timer().now()
}

/// Ticks elapsed since `then`
pub fn elapsed(then: Tick) -> Ticks {
    timer().elapsed(then)
}

/// Suspend the current thread for at least `duration` ticks
pub fn sleep_ticks(duration: Ticks) {
    timer().sleep_ticks(duration)
}

/// Sleep for approximately `ms` milliseconds
pub fn sleep_ms(ms: i64) {
    timer().sleep_ms(ms)
}

/// Sleep for approximately `us` microseconds
pub fn sleep_us(us: i64) {
    timer().sleep_us(us)
}

/// Sleep for approximately `ns` nanoseconds
pub fn sleep_ns(ns: i64) {
    timer().sleep_ns(ns)
}

/// Busy-wait for approximately `ms` milliseconds
pub fn busy_delay_ms(ms: i64) {
    timer().busy_delay_ms(ms)
}

/// Busy-wait for approximately `us` microseconds
pub fn busy_delay_us(us: i64) {
    timer().busy_delay_us(us)
}

/// Busy-wait for approximately `ns` nanoseconds
pub fn busy_delay_ns(ns: i64) {
    timer().busy_delay_ns(ns)
}
