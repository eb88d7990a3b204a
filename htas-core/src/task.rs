/*
SPDX-License-Identifier: MIT
*/

//! Task intent profiles and per-task scheduler state.
//!
//! A [`TaskProfile`] is the *hint surface*: a caller-supplied declaration of
//! a task's character plus an optional primary-data-region address.  Setting
//! a profile attaches a zero-initialised [`SchedState`] to the task and
//! derives from the hint:
//!
//! * the CPU affinity mask (intent kind, optionally intersected with the CPUs
//!   of the data region's NUMA node),
//! * the `LOW_LATENCY` priority boost,
//! * the preferred NUMA node.
//!
//! The NUMA intersection must never leave a task unschedulable: an empty
//! intersection falls back to the intent-only mask and logs a diagnostic.
//!
//! # Lifecycle
//! State is created on first profile set, mutated only by the scheduler tick
//! (wait counters, aging, counters) and by later profile sets, and destroyed
//! with the owning task.  The state references its owner by id, never by
//! pointer.

use thiserror::Error;
use tracing::{info, warn};

use crate::topology::{CpuMask, Topology};

/// Priority boost granted to `LOW_LATENCY` tasks.
pub const LOW_LATENCY_PRIORITY_BOOST: i32 = 10;

/// Capacity of the task registry.
pub const MAX_TASKS: usize = 64;

// ── Task intent ───────────────────────────────────────────────────────────────

/// Caller-declared character of a task.
///
/// A closed sum type — scoring and statistics are total functions over it,
/// never sentinel integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskIntent {
    /// CPU-bound, long-running (e.g. a video render).
    Performance,
    /// Background work (e.g. file indexing).
    Efficiency,
    /// Interactive, deadline-sensitive (e.g. a UI or game loop).
    LowLatency,
    /// No hint provided.
    #[default]
    Default,
}

impl TaskIntent {
    pub const COUNT: usize = 4;

    pub const ALL: [TaskIntent; TaskIntent::COUNT] = [
        TaskIntent::Performance,
        TaskIntent::Efficiency,
        TaskIntent::LowLatency,
        TaskIntent::Default,
    ];

    pub fn index(self) -> usize {
        match self {
            TaskIntent::Performance => 0,
            TaskIntent::Efficiency => 1,
            TaskIntent::LowLatency => 2,
            TaskIntent::Default => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskIntent::Performance => "PERFORMANCE",
            TaskIntent::Efficiency => "EFFICIENCY",
            TaskIntent::LowLatency => "LOW_LATENCY",
            TaskIntent::Default => "DEFAULT",
        }
    }
}

// ── Task profile ──────────────────────────────────────────────────────────────

/// The hint: intent plus an optional primary data region.
///
/// Immutable after set — updating a task's hint means setting a whole new
/// profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskProfile {
    pub intent: TaskIntent,
    /// Address of the task's primary data region, used to derive a preferred
    /// NUMA node.  `None` means no NUMA preference.
    pub primary_data_region: Option<u64>,
    pub data_size: u64,
}

impl TaskProfile {
    pub fn new(intent: TaskIntent) -> Self {
        Self { intent, primary_data_region: None, data_size: 0 }
    }

    pub fn with_data_region(intent: TaskIntent, addr: u64, size: u64) -> Self {
        Self { intent, primary_data_region: Some(addr), data_size: size }
    }
}

// ── Per-task scheduler state ──────────────────────────────────────────────────

/// Scheduler state attached to a task on first profile set.
///
/// Zero-initialised on attach; a later profile set recomputes only the
/// derived fields (`affinity`, `priority_boost`, `preferred_numa_node`) and
/// leaves aging and inference state untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedState {
    pub affinity: CpuMask,
    pub priority_boost: i32,
    pub preferred_numa_node: u8,

    // Aging
    pub wait_time: u32,
    pub priority_boost_aging: i32,

    // Behaviour inference (dynamic policy only)
    pub recent_cpu_ticks: u32,
    pub inferred_numa_node: u8,
    pub inferred_numa_locked: bool,

    // Counters
    pub total_switches: u64,
    pub numa_penalties: u64,
}

/// Derive the affinity mask for a profile.
///
/// Intent picks the core kind; a data region restricts to its NUMA node's
/// CPUs.  If the intersection is empty the intent-only mask wins — a task
/// must never end up unschedulable.
pub fn affinity_for_profile(topology: &Topology, profile: &TaskProfile) -> CpuMask {
    use crate::topology::CpuKind;

    let intent_mask = match profile.intent {
        TaskIntent::Performance | TaskIntent::LowLatency => {
            topology.mask_of_kind(CpuKind::Performance)
        }
        TaskIntent::Efficiency => topology.mask_of_kind(CpuKind::Efficiency),
        TaskIntent::Default => topology.online_mask(),
    };

    let Some(addr) = profile.primary_data_region else {
        return intent_mask;
    };

    let node = topology.numa_node_of_address(addr);
    let restricted = intent_mask.intersect(topology.mask_of_node(node));
    if restricted.is_empty() {
        warn!(
            intent = profile.intent.label(),
            numa_node = node,
            "NUMA restriction eliminated all CPUs, using intent mask"
        );
        intent_mask
    } else {
        restricted
    }
}

// ── Task registry ─────────────────────────────────────────────────────────────

/// A registered task (a process stand-in).
#[derive(Debug, Clone)]
pub struct Task {
    pub pid: u32,
    pub name: String,
    pub profile: Option<TaskProfile>,
    pub sched: Option<SchedState>,
}

/// Errors from the profile surface, recovered locally by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// No task with the given pid is registered.
    #[error("no task with pid {pid}")]
    UnknownTask { pid: u32 },

    /// The registry has no free slot left.
    #[error("task registry is full ({capacity} slots)")]
    RegistryFull { capacity: usize },
}

/// Fixed-capacity task registry.
///
/// Owns each task and its scheduler state exclusively; lookups go by pid.
#[derive(Debug, Default)]
pub struct TaskTable {
    tasks: Vec<Task>,
    next_pid: u32,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return its pid.
    pub fn register(&mut self, name: impl Into<String>) -> Result<u32, ProfileError> {
        if self.tasks.len() >= MAX_TASKS {
            return Err(ProfileError::RegistryFull { capacity: MAX_TASKS });
        }
        let pid = self.next_pid;
        self.next_pid += 1;
        self.tasks.push(Task { pid, name: name.into(), profile: None, sched: None });
        Ok(pid)
    }

    pub fn find(&self, pid: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.pid == pid)
    }

    pub fn find_mut(&mut self, pid: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.pid == pid)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Attach or update a task's profile (§"set_profile" syscall).
    ///
    /// 1. Locate the task; fail if absent.
    /// 2. Attach zero-initialised scheduler state if not already present.
    /// 3. Copy the profile.
    /// 4. Recompute affinity mask, priority boost and preferred NUMA node.
    ///    Aging and inference fields are not touched.
    pub fn set_profile(
        &mut self,
        topology: &Topology,
        pid: u32,
        profile: &TaskProfile,
    ) -> Result<(), ProfileError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.pid == pid)
            .ok_or(ProfileError::UnknownTask { pid })?;

        let sched = task.sched.get_or_insert_with(SchedState::default);
        task.profile = Some(*profile);

        sched.affinity = affinity_for_profile(topology, profile);
        sched.priority_boost = if profile.intent == TaskIntent::LowLatency {
            LOW_LATENCY_PRIORITY_BOOST
        } else {
            0
        };
        sched.preferred_numa_node = profile
            .primary_data_region
            .map(|addr| topology.numa_node_of_address(addr))
            .unwrap_or(0);

        info!(
            pid,
            intent = profile.intent.label(),
            affinity = %sched.affinity,
            numa_node = sched.preferred_numa_node,
            "profile set"
        );
        Ok(())
    }

    /// Syscall-shaped wrapper: `0` on success, `-1` on failure.
    pub fn sys_set_profile(&mut self, topology: &Topology, pid: u32, profile: &TaskProfile) -> i32 {
        match self.set_profile(topology, pid, profile) {
            Ok(()) => 0,
            Err(err) => {
                warn!(pid, %err, "set_profile failed");
                -1
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
