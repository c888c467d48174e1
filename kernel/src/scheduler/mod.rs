//! Scheduler interface
//!
//! The ready queue, context switching and the feedback-priority formulas
//! live in the kernel's scheduler. The time subsystem only needs the narrow
//! surface below: who is running, park it, hand it back, and read or write
//! its feedback fields.

use core::fmt;

/// Handle to a thread in the scheduler's thread table.
///
/// Non-owning: the scheduler keeps the thread alive for as long as it can be
/// blocked, which covers every sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Feedback-priority bookkeeping of one thread.
///
/// Captured when a thread goes to sleep and written back when it wakes, so a
/// sleep never moves a thread within the feedback hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackState {
    /// Queue level
    pub priority: i32,
    /// Ticks consumed at that level
    pub quantum_used: i32,
}

impl FeedbackState {
    pub const fn new(priority: i32, quantum_used: i32) -> Self {
        Self {
            priority,
            quantum_used,
        }
    }
}

/// Scheduler entry points used by the sleep API and the wake dispatcher.
pub trait ThreadScheduler: Sync {
    /// Thread running on this CPU
    fn current(&self) -> ThreadId;

    /// Move the current thread from running to blocked and switch away.
    ///
    /// Called with interrupts masked. Returns only after [`reactivate`] was
    /// called for this thread and it was scheduled again, with interrupts
    /// masked as they were at the call.
    ///
    /// [`reactivate`]: ThreadScheduler::reactivate
    fn block_current(&self);

    /// Move a blocked thread to the ready queue.
    ///
    /// Called from the tick interrupt; must not block.
    fn reactivate(&self, thread: ThreadId);

    /// Per-tick bookkeeping (quantum accounting, priority recomputation).
    ///
    /// Called from the tick interrupt after the counter advanced and before
    /// sleepers are woken.
    fn notify_tick(&self);

    /// Current feedback fields of `thread`
    fn feedback(&self, thread: ThreadId) -> FeedbackState;

    /// Overwrite the feedback fields of `thread`
    fn set_feedback(&self, thread: ThreadId, state: FeedbackState);
}
