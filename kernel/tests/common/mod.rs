//! Hosted stand-ins for the CPU and the scheduler.
//!
//! Every simulated kernel thread is a real OS thread. "Interrupts masked"
//! means owning the simulated core: a thread that masks interrupts excludes
//! the tick handler (driven by the test) and every other kernel thread until
//! it unmasks them or blocks.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use exo_kernel_timer::arch::{InterruptControl, IntrLevel, TickSource};
use exo_kernel_timer::scheduler::{FeedbackState, ThreadId, ThreadScheduler};

const WAIT_LIMIT: Duration = Duration::from_secs(10);

thread_local! {
    static CURRENT: Cell<Option<ThreadId>> = Cell::new(None);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Running,
    Blocked,
    Ready,
    Exited,
}

#[derive(Debug)]
struct SimThread {
    state: SimState,
    feedback: FeedbackState,
    times_blocked: u32,
    woken_at: Vec<i64>,
    feedback_at_wake: Vec<FeedbackState>,
}

#[derive(Debug, Default)]
struct Table {
    threads: HashMap<ThreadId, SimThread>,
    ticks: i64,
    set_feedback_calls: u32,
}

pub struct SimKernel {
    /// OS thread owning the simulated core, if any
    core_owner: Mutex<Option<thread::ThreadId>>,
    core_released: Condvar,
    table: Mutex<Table>,
    changed: Condvar,
    /// Reset every blocked thread's feedback fields on each tick
    recompute_on_tick: bool,
}

impl SimKernel {
    pub fn new() -> Self {
        Self {
            core_owner: Mutex::new(None),
            core_released: Condvar::new(),
            table: Mutex::new(Table::default()),
            changed: Condvar::new(),
            recompute_on_tick: false,
        }
    }

    /// Scheduler that rewrites sleeping threads' feedback state every tick,
    /// like a priority recomputation would.
    pub fn with_recompute() -> Self {
        Self {
            recompute_on_tick: true,
            ..Self::new()
        }
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap()
    }

    /// Start a kernel thread with the given feedback state.
    pub fn spawn<'scope, 'env, F>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        id: u64,
        feedback: FeedbackState,
        body: F,
    ) -> ScopedJoinHandle<'scope, ()>
    where
        F: FnOnce() + Send + 'scope,
    {
        let id = ThreadId(id);
        self.table().threads.insert(
            id,
            SimThread {
                state: SimState::Running,
                feedback,
                times_blocked: 0,
                woken_at: Vec::new(),
                feedback_at_wake: Vec::new(),
            },
        );
        scope.spawn(move || {
            CURRENT.with(|current| current.set(Some(id)));
            body();
            let mut table = self.table();
            table.threads.get_mut(&id).unwrap().state = SimState::Exited;
            self.changed.notify_all();
        })
    }

    pub fn state(&self, id: u64) -> SimState {
        self.table().threads[&ThreadId(id)].state
    }

    pub fn times_blocked(&self, id: u64) -> u32 {
        self.table().threads[&ThreadId(id)].times_blocked
    }

    /// Scheduler tick at each reactivation of `id`
    pub fn woken_at(&self, id: u64) -> Vec<i64> {
        self.table().threads[&ThreadId(id)].woken_at.clone()
    }

    /// Feedback state of `id` at each reactivation
    pub fn feedback_at_wake(&self, id: u64) -> Vec<FeedbackState> {
        self.table().threads[&ThreadId(id)].feedback_at_wake.clone()
    }

    pub fn feedback_of(&self, id: u64) -> FeedbackState {
        self.table().threads[&ThreadId(id)].feedback
    }

    pub fn set_feedback_calls(&self) -> u32 {
        self.table().set_feedback_calls
    }

    /// Block the test until `id` reaches `state`.
    pub fn wait_for(&self, id: u64, state: SimState) {
        let deadline = Instant::now() + WAIT_LIMIT;
        let mut table = self.table();
        while table.threads[&ThreadId(id)].state != state {
            let left = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| panic!("T{} never reached {:?}", id, state));
            table = self.changed.wait_timeout(table, left).unwrap().0;
        }
    }

    fn acquire_core(&self) -> IntrLevel {
        let me = thread::current().id();
        let mut owner = self.core_owner.lock().unwrap();
        if *owner == Some(me) {
            return IntrLevel::Off;
        }
        while owner.is_some() {
            owner = self.core_released.wait(owner).unwrap();
        }
        *owner = Some(me);
        IntrLevel::On
    }

    fn release_core(&self) -> IntrLevel {
        let me = thread::current().id();
        let mut owner = self.core_owner.lock().unwrap();
        if *owner != Some(me) {
            return IntrLevel::On;
        }
        *owner = None;
        self.core_released.notify_all();
        IntrLevel::Off
    }
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for SimKernel {
    fn level(&self) -> IntrLevel {
        if *self.core_owner.lock().unwrap() == Some(thread::current().id()) {
            IntrLevel::Off
        } else {
            IntrLevel::On
        }
    }

    fn disable(&self) -> IntrLevel {
        self.acquire_core()
    }

    fn enable(&self) -> IntrLevel {
        self.release_core()
    }
}

impl ThreadScheduler for SimKernel {
    fn current(&self) -> ThreadId {
        CURRENT
            .with(|current| current.get())
            .expect("not a simulated kernel thread")
    }

    fn block_current(&self) {
        assert_eq!(self.level(), IntrLevel::Off, "block_current with interrupts on");
        let id = self.current();
        {
            let mut table = self.table();
            let thread = table.threads.get_mut(&id).unwrap();
            assert_eq!(thread.state, SimState::Running);
            thread.state = SimState::Blocked;
            thread.times_blocked += 1;
            self.changed.notify_all();
        }

        // Switch away: the next context runs with interrupts on.
        self.release_core();
        {
            let mut table = self.table();
            while table.threads[&id].state != SimState::Ready {
                table = self.changed.wait(table).unwrap();
            }
        }
        // Switched back in, interrupts masked as at the call.
        self.acquire_core();

        let mut table = self.table();
        table.threads.get_mut(&id).unwrap().state = SimState::Running;
        self.changed.notify_all();
    }

    fn reactivate(&self, id: ThreadId) {
        let mut table = self.table();
        let ticks = table.ticks;
        let thread = table.threads.get_mut(&id).unwrap();
        assert_eq!(thread.state, SimState::Blocked, "{} reactivated while not blocked", id);
        thread.state = SimState::Ready;
        thread.woken_at.push(ticks);
        let feedback = thread.feedback;
        thread.feedback_at_wake.push(feedback);
        self.changed.notify_all();
    }

    fn notify_tick(&self) {
        let mut table = self.table();
        table.ticks += 1;
        if self.recompute_on_tick {
            for thread in table.threads.values_mut() {
                if thread.state == SimState::Blocked {
                    thread.feedback = FeedbackState::new(0, 0);
                }
            }
        }
    }

    fn feedback(&self, id: ThreadId) -> FeedbackState {
        self.table().threads[&id].feedback
    }

    fn set_feedback(&self, id: ThreadId, state: FeedbackState) {
        let mut table = self.table();
        table.set_feedback_calls += 1;
        table.threads.get_mut(&id).unwrap().feedback = state;
    }
}

/// Tick source that records its programming instead of touching hardware.
#[derive(Default)]
pub struct RecordingSource {
    pub programmed: Mutex<Option<(u32, fn())>>,
}

impl TickSource for RecordingSource {
    fn start_periodic(&self, frequency: u32, handler: fn()) {
        *self.programmed.lock().unwrap() = Some((frequency, handler));
    }
}
