/*
SPDX-License-Identifier: MIT
*/

//! Preemptive kernel-thread scheduler.
//!
//! A multilevel priority scheduler over real thread stacks, sharing the
//! simulator's priority-aging philosophy but performing actual
//! callee-saved-register context switches (see [`arch`]).
//!
//! * Four priority levels with per-level quanta; lower number = higher
//!   priority; threads are created `Interactive`.
//! * Every tick, every ready thread's wait clock advances; a thread that has
//!   waited [`AGING_THRESHOLD`] ticks is promoted one level, so any ready
//!   thread reaches `Realtime` within `3 * AGING_THRESHOLD` ticks.
//! * Preemption happens on quantum exhaustion or when a strictly
//!   higher-priority thread is ready; both route through the cooperative
//!   yield.
//!
//! Slot 0 is the bootstrap thread — the context that created the scheduler.
//! Selection never picks it; it resumes only when a finishing thread parks
//! with nothing else ready.
//!
//! # Concurrency model
//! Strictly single CPU: the in-kernel discipline of "interrupts disabled
//! during selection and switch" maps here to plain single-threaded calls.
//! Exactly one thread is `Running` at any moment.  The scheduler is boxed so
//! its address stays stable for the pointer each spawned thread carries.

pub mod arch;

use std::ffi::c_void;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::aging::AgingDiscipline;

/// Capacity of the thread table (slot 0 is the bootstrap thread).
pub const MAX_THREADS: usize = 16;

/// Bytes of stack per thread.
pub const STACK_SIZE: usize = 64 * 1024;

/// Waiting ticks at which a ready thread is promoted one priority level.
pub const AGING_THRESHOLD: u32 = 32;

const BOOTSTRAP_TID: usize = 0;

// ── Thread model ──────────────────────────────────────────────────────────────

/// Lifecycle state of a thread slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Unused,
    Ready,
    Running,
    Blocked,
}

/// Priority levels; declaration order is scheduling order (highest first),
/// so the derived `Ord` matches "lower number wins".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreadPriority {
    Realtime,
    Interactive,
    Background,
    Batch,
}

impl ThreadPriority {
    pub const DEFAULT: ThreadPriority = ThreadPriority::Interactive;

    /// Quantum in ticks granted at this level.
    pub fn quantum(self) -> u8 {
        match self {
            ThreadPriority::Realtime => 4,
            ThreadPriority::Interactive => 6,
            ThreadPriority::Background => 10,
            ThreadPriority::Batch => 18,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThreadPriority::Realtime => "RT",
            ThreadPriority::Interactive => "INT",
            ThreadPriority::Background => "BG",
            ThreadPriority::Batch => "BATCH",
        }
    }

    /// One level closer to `Realtime`.
    pub fn promoted(self) -> ThreadPriority {
        match self {
            ThreadPriority::Realtime | ThreadPriority::Interactive => ThreadPriority::Realtime,
            ThreadPriority::Background => ThreadPriority::Interactive,
            ThreadPriority::Batch => ThreadPriority::Background,
        }
    }
}

struct Kthread {
    sp: usize,
    state: ThreadState,
    name: String,
    priority: ThreadPriority,
    slice_left: u8,
    wait_ticks: u32,
    /// Owns the stack memory `sp` points into.  `None` for the bootstrap
    /// thread, whose stack belongs to the host.
    stack: Option<Box<[u8]>>,
}

impl Kthread {
    fn unused() -> Self {
        Self {
            sp: 0,
            state: ThreadState::Unused,
            name: String::new(),
            priority: ThreadPriority::DEFAULT,
            slice_left: 0,
            wait_ticks: 0,
            stack: None,
        }
    }
}

/// Read-only view of one thread slot for the `ps` surface.
#[derive(Debug, Clone)]
pub struct ThreadSnapshot {
    pub tid: usize,
    pub name: String,
    pub state: ThreadState,
    pub priority: ThreadPriority,
    pub wait_ticks: u32,
    pub is_current: bool,
}

/// Errors from the thread surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThreadError {
    /// Every slot is occupied (stack allocation is the fatal analog in the
    /// original; a full table is the recoverable one here).
    #[error("thread table is full ({MAX_THREADS} slots)")]
    TableFull,

    #[error("no thread with id {tid}")]
    UnknownThread { tid: usize },
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Handle passed to thread bodies so they can reach scheduling services
/// (cooperative yield, timer tick) the way in-kernel code would.
///
/// Valid only while the owning [`KernelScheduler`] is alive; the scheduler
/// is boxed precisely so this pointer stays stable.
#[derive(Clone, Copy)]
pub struct SchedRef {
    sched: *mut KernelScheduler,
}

impl SchedRef {
    pub fn yield_now(&self) {
        // SAFETY: single-threaded cooperative scheduling; the scheduler
        // outlives every thread it runs.
        unsafe { (*self.sched).yield_now() }
    }

    pub fn tick(&self) {
        // SAFETY: as above.
        unsafe { (*self.sched).tick() }
    }
}

/// The kernel-thread scheduler: thread table, aging clock, current slot.
pub struct KernelScheduler {
    threads: Vec<Kthread>,
    current: usize,
    aging: AgingDiscipline,
}

impl KernelScheduler {
    /// Create a scheduler whose slot 0 captures the calling context as the
    /// bootstrap/idle thread (state `Running`).
    ///
    /// Boxed so the address spawned threads carry stays stable.
    pub fn new() -> Box<Self> {
        let mut threads: Vec<Kthread> = (0..MAX_THREADS).map(|_| Kthread::unused()).collect();
        let idle = &mut threads[BOOTSTRAP_TID];
        idle.state = ThreadState::Running;
        idle.name = "idle".to_string();
        idle.priority = ThreadPriority::Batch;
        idle.slice_left = ThreadPriority::Batch.quantum();

        Box::new(Self {
            threads,
            current: BOOTSTRAP_TID,
            aging: AgingDiscipline::new(AGING_THRESHOLD),
        })
    }

    /// Create a thread executing `f` on a fresh stack at the default
    /// priority.  If `f` returns, the thread parks permanently.
    pub fn spawn<F>(&mut self, name: &str, f: F) -> Result<usize, ThreadError>
    where
        F: FnOnce(SchedRef) + 'static,
    {
        let tid = (1..MAX_THREADS)
            .find(|&i| self.threads[i].state == ThreadState::Unused)
            .ok_or(ThreadError::TableFull)?;

        let sched_ptr: *mut KernelScheduler = self;
        let pack = EntryPack {
            body: Box::new(move || f(SchedRef { sched: sched_ptr })),
            sched: sched_ptr,
        };
        let arg = Box::into_raw(Box::new(pack)) as *mut c_void;

        let mut stack = vec![0u8; STACK_SIZE].into_boxed_slice();
        // SAFETY: the stack box is stored in the slot below and lives until
        // the slot is reused; the scheduler itself is boxed and outlives it.
        let sp = unsafe { arch::prepare_stack(&mut stack, thread_entry, arg) };

        let thread = &mut self.threads[tid];
        thread.sp = sp;
        thread.state = ThreadState::Ready;
        thread.name = name.to_string();
        thread.priority = ThreadPriority::DEFAULT;
        thread.slice_left = thread.priority.quantum();
        thread.wait_ticks = 0;
        thread.stack = Some(stack);

        info!(tid, name, "kernel thread created");
        Ok(tid)
    }

    /// Re-prioritise a thread, resetting its wait clock and quantum.
    pub fn set_priority(
        &mut self,
        tid: usize,
        priority: ThreadPriority,
    ) -> Result<(), ThreadError> {
        let thread = self
            .threads
            .get_mut(tid)
            .filter(|t| t.state != ThreadState::Unused)
            .ok_or(ThreadError::UnknownThread { tid })?;
        thread.priority = priority;
        thread.wait_ticks = 0;
        thread.slice_left = priority.quantum();
        Ok(())
    }

    /// Timer tick: advance wait clocks, spend the current quantum, apply
    /// aging, preempt on priority inversion or quantum exhaustion.
    pub fn tick(&mut self) {
        for i in 1..MAX_THREADS {
            if i != self.current && self.threads[i].state == ThreadState::Ready {
                self.aging.record_wait(&mut self.threads[i].wait_ticks);
            }
        }

        let cur = self.current;
        if self.threads[cur].slice_left > 0 {
            self.threads[cur].slice_left -= 1;
        }

        self.apply_aging();

        if let Some(next) = self.select_next() {
            if self.threads[next].priority < self.threads[cur].priority
                || self.threads[cur].slice_left == 0
            {
                self.threads[cur].slice_left = self.threads[cur].priority.quantum();
                self.yield_now();
                return;
            }
        }

        if self.threads[cur].slice_left == 0 {
            self.threads[cur].slice_left = self.threads[cur].priority.quantum();
        }
    }

    /// Cooperative yield: pick the best ready thread and switch to it.
    /// Returns immediately when nothing else is ready.
    pub fn yield_now(&mut self) {
        self.apply_aging();
        let Some(next) = self.select_next() else {
            return;
        };
        if next == self.current {
            return;
        }

        // Switching to anything but a READY thread is a scheduler bug.
        debug_assert_eq!(self.threads[next].state, ThreadState::Ready);
        debug_assert!(self.sp_is_valid(next), "switch target stack pointer out of range");

        let prev = self.current;
        self.threads[prev].state = ThreadState::Ready;
        self.threads[prev].wait_ticks = 0;
        self.threads[prev].slice_left = self.threads[prev].priority.quantum();

        self.threads[next].state = ThreadState::Running;
        self.threads[next].wait_ticks = 0;
        self.threads[next].slice_left = self.threads[next].priority.quantum();
        self.current = next;

        let prev_sp: *mut usize = &mut self.threads[prev].sp;
        let next_sp = self.threads[next].sp;
        debug!(from = prev, to = next, "context switch");
        // SAFETY: both stack pointers belong to live stacks owned by this
        // scheduler; single-threaded, so the suspended frame is untouched
        // until control switches back here.
        unsafe { arch::htas_ctx_switch(prev_sp, next_sp) };
    }

    /// Snapshot of every live slot for the `ps` surface.
    pub fn snapshot(&self) -> Vec<ThreadSnapshot> {
        self.threads
            .iter()
            .enumerate()
            .filter(|(_, t)| t.state != ThreadState::Unused)
            .map(|(tid, t)| ThreadSnapshot {
                tid,
                name: t.name.clone(),
                state: t.state,
                priority: t.priority,
                wait_ticks: t.wait_ticks,
                is_current: tid == self.current,
            })
            .collect()
    }

    pub fn current_tid(&self) -> usize {
        self.current
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Promote every ready thread whose wait clock has reached the
    /// threshold.  Guarantees any continuously-ready thread hits `Realtime`
    /// within `3 * AGING_THRESHOLD` ticks.
    fn apply_aging(&mut self) {
        for i in 1..MAX_THREADS {
            let thread = &mut self.threads[i];
            if thread.state == ThreadState::Ready
                && self.aging.reached(thread.wait_ticks)
                && thread.priority != ThreadPriority::Realtime
            {
                thread.priority = thread.priority.promoted();
                self.aging.reset(&mut thread.wait_ticks);
                thread.slice_left = thread.priority.quantum();
                debug!(tid = i, priority = thread.priority.label(), "aging promotion");
            }
        }
    }

    /// Every non-unused thread's saved stack pointer must lie inside its own
    /// stack allocation; the bootstrap thread runs on the host stack.
    fn sp_is_valid(&self, tid: usize) -> bool {
        match &self.threads[tid].stack {
            None => tid == BOOTSTRAP_TID,
            Some(stack) => {
                let base = stack.as_ptr() as usize;
                let sp = self.threads[tid].sp;
                sp >= base && sp <= base + stack.len()
            }
        }
    }

    /// Best ready thread excluding the bootstrap slot: lowest priority
    /// number, ties broken by longest wait, then lowest index.
    fn select_next(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in 1..MAX_THREADS {
            let thread = &self.threads[i];
            if thread.state != ThreadState::Ready {
                continue;
            }
            match best {
                None => best = Some(i),
                Some(b) => {
                    let incumbent = &self.threads[b];
                    if thread.priority < incumbent.priority
                        || (thread.priority == incumbent.priority
                            && thread.wait_ticks > incumbent.wait_ticks)
                    {
                        best = Some(i);
                    }
                }
            }
        }
        best
    }

    /// Park the finishing thread and hand the CPU to the next ready thread,
    /// falling back to the bootstrap slot.  Never returns.
    fn exit_current(&mut self) -> ! {
        let prev = self.current;
        self.threads[prev].state = ThreadState::Blocked;
        debug!(tid = prev, name = %self.threads[prev].name, "thread finished, parked");

        let next = self.select_next().unwrap_or(BOOTSTRAP_TID);
        debug_assert_ne!(next, prev);
        debug_assert!(self.sp_is_valid(next), "switch target stack pointer out of range");
        self.threads[next].state = ThreadState::Running;
        self.threads[next].wait_ticks = 0;
        self.threads[next].slice_left = self.threads[next].priority.quantum();
        self.current = next;

        let next_sp = self.threads[next].sp;
        let mut discarded = 0usize;
        // SAFETY: the parked context is never resumed, so its stack pointer
        // can be discarded; `next_sp` belongs to a live stack.
        unsafe { arch::htas_ctx_switch(&mut discarded, next_sp) };
        unreachable!("parked thread resumed");
    }
}

/// What a fresh thread starts with: its body and the way back into the
/// scheduler once the body is done.
struct EntryPack {
    body: Box<dyn FnOnce()>,
    sched: *mut KernelScheduler,
}

/// First Rust frame on a fresh thread stack: runs the boxed body (containing
/// any panic so it cannot unwind into the assembly trampoline), then parks
/// the thread.  Never returns.
unsafe extern "C" fn thread_entry(arg: *mut c_void) -> ! {
    let pack = unsafe { Box::from_raw(arg as *mut EntryPack) };
    let body = pack.body;
    let sched = pack.sched;
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || body())).is_err() {
        error!("kernel thread body panicked");
    }
    // SAFETY: the scheduler is boxed and outlives every thread it runs.
    unsafe { (*sched).exit_current() }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
