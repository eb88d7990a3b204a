//! Per-policy statistics records.
//!
//! One [`SchedulerStats`] is kept per selection policy and written only by
//! that policy's benchmark phase.  Records are reset to all zeroes between
//! phases, so two runs with identical inputs produce identical records.

use std::ops::{Index, IndexMut};

use crate::task::TaskIntent;

/// Per-intent breakdown inside a [`SchedulerStats`] record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentStats {
    pub runtime_us: u64,
    pub switches: u64,
    /// Mean release-to-first-run latency (LOW_LATENCY slot only).
    pub avg_latency_us: u64,
    /// Worst release-to-first-run latency (LOW_LATENCY slot only).
    pub max_jitter_us: u64,
}

/// Array of [`IntentStats`] keyed by [`TaskIntent`].
///
/// Indexing by the enum instead of a raw integer keeps the per-intent table
/// total over the closed set of intents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSlots([IntentStats; TaskIntent::COUNT]);

impl Index<TaskIntent> for IntentSlots {
    type Output = IntentStats;

    fn index(&self, intent: TaskIntent) -> &IntentStats {
        &self.0[intent.index()]
    }
}

impl IndexMut<TaskIntent> for IntentSlots {
    fn index_mut(&mut self, intent: TaskIntent) -> &mut IntentStats {
        &mut self.0[intent.index()]
    }
}

impl IntentSlots {
    pub fn iter(&self) -> impl Iterator<Item = (TaskIntent, &IntentStats)> {
        TaskIntent::ALL.iter().map(move |&intent| (intent, &self[intent]))
    }
}

/// Scheduler statistics for one benchmark phase under one policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_ticks: u64,
    pub context_switches: u64,
    pub numa_penalties: u64,
    pub pcore_time_us: u64,
    pub ecore_time_us: u64,
    /// Power proxy in arbitrary units.
    pub total_power_consumption: u64,
    pub intent: IntentSlots,
}

impl SchedulerStats {
    /// Zero every counter, ready for the next benchmark phase.
    pub fn reset(&mut self) {
        *self = SchedulerStats::default();
    }

    /// Total accounted CPU residency across both core kinds.
    pub fn total_core_time_us(&self) -> u64 {
        self.pcore_time_us + self.ecore_time_us
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
