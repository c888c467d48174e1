//! Sleep registry
//!
//! Unordered intrusive list of [`SleepRecord`]s. Records live on the stack
//! of the thread that is sleeping; the list only links them, so neither
//! publishing nor waking allocates.

use intrusive_collections::{intrusive_adapter, LinkedList, LinkedListLink, UnsafeRef};

use super::ticks::Tick;
use crate::scheduler::{FeedbackState, ThreadId};

/// One suspended thread: who, until when, and what to restore.
pub struct SleepRecord {
    thread: ThreadId,
    deadline: Tick,
    saved: Option<FeedbackState>,
    link: LinkedListLink,
}

intrusive_adapter!(SleepAdapter = UnsafeRef<SleepRecord>: SleepRecord { link: LinkedListLink });

impl SleepRecord {
    /// `saved` is present only in feedback-priority mode
    pub fn new(thread: ThreadId, deadline: Tick, saved: Option<FeedbackState>) -> Self {
        Self {
            thread,
            deadline,
            saved,
            link: LinkedListLink::new(),
        }
    }

    #[inline]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// First tick at which the thread may run again
    #[inline]
    pub fn deadline(&self) -> Tick {
        self.deadline
    }

    #[inline]
    pub fn saved(&self) -> Option<FeedbackState> {
        self.saved
    }

    /// Whether the record is still in a registry
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.link.is_linked()
    }

    #[inline]
    fn is_due(&self, now: Tick) -> bool {
        now >= self.deadline
    }
}

impl Drop for SleepRecord {
    fn drop(&mut self) {
        debug_assert!(
            !self.link.is_linked(),
            "sleep record for {} dropped while queued",
            self.thread
        );
    }
}

/// The set of sleeping threads.
pub struct SleepQueue {
    list: LinkedList<SleepAdapter>,
    len: usize,
}

// SAFETY: the raw links are only followed by whoever owns the queue, and the
// queue is only reachable through an `IrqCell`, so one context at a time.
unsafe impl Send for SleepQueue {}

impl SleepQueue {
    pub fn new() -> Self {
        Self {
            list: LinkedList::new(SleepAdapter::new()),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Whether `thread` currently has a record queued
    pub fn contains(&self, thread: ThreadId) -> bool {
        self.list.iter().any(|record| record.thread == thread)
    }

    /// Publish `record`.
    ///
    /// # Safety
    ///
    /// `record` must neither move nor be dropped until [`wake_expired`]
    /// has removed it. The sleep API guarantees this by keeping the record
    /// on the stack frame that is blocked until the dispatcher wakes it.
    ///
    /// [`wake_expired`]: SleepQueue::wake_expired
    pub unsafe fn insert(&mut self, record: &SleepRecord) {
        debug_assert!(!record.is_queued(), "sleep record queued twice");
        debug_assert!(
            !self.contains(record.thread),
            "{} already sleeping",
            record.thread
        );
        // SAFETY: the caller keeps `record` alive and in place while linked.
        self.list
            .push_back(unsafe { UnsafeRef::from_raw(record as *const SleepRecord) });
        self.len += 1;
    }

    /// Unlink every record whose deadline is `<= now` and pass its thread
    /// and snapshot to `wake`.
    ///
    /// `wake` runs after the record is unlinked, so it may hand the thread
    /// back to the scheduler: the record is never touched again. Returns the
    /// number of threads woken.
    pub fn wake_expired<F>(&mut self, now: Tick, mut wake: F) -> usize
    where
        F: FnMut(ThreadId, Option<FeedbackState>),
    {
        let mut woken = 0;
        let mut cursor = self.list.front_mut();

        while let Some(record) = cursor.get() {
            if !record.is_due(now) {
                cursor.move_next();
                continue;
            }

            let (thread, saved) = (record.thread, record.saved);
            // Advances the cursor to the next record.
            cursor.remove();
            self.len -= 1;
            woken += 1;
            wake(thread, saved);
        }

        woken
    }
}

impl Default for SleepQueue {
    fn default() -> Self {
        Self::new()
    }
}
