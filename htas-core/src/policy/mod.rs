/*
SPDX-License-Identifier: MIT
*/

//! The three selection policies.
//!
//! All three are *pure* over `(ready set, CPU identity, current tick, policy
//! state)`: they never block, never allocate and never mutate task state.
//! The driver marks the chosen task as claimed afterwards and applies every
//! other mutation during accounting.
//!
//! | Policy | Input it scores on |
//! |---|---|
//! | [`PolicyKind::Baseline`] | nothing — plain round-robin over the ready set |
//! | [`PolicyKind::Htas`] | explicit hints (preferred kind, preferred node, intent) |
//! | [`PolicyKind::Dynamic`] | inferred behaviour (recent load, learned node, recent wake) |
//!
//! Scores tie-break towards the lowest task index, which keeps selection
//! deterministic for identical inputs.

use std::str::FromStr;

use crate::sim::SimTask;
use crate::task::TaskIntent;
use crate::topology::{CpuInfo, CpuKind};

/// Ticks of the sliding load window used by the dynamic policy.
pub const DYNAMIC_INFERENCE_WINDOW: u32 = 50;

/// Load (ticks within the window) past which a task is treated as a
/// performance task by the dynamic policy.
pub const DYNAMIC_LOAD_THRESHOLD: u32 = 25;

// ── Policy identity ───────────────────────────────────────────────────────────

/// Which selection policy drives the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// Topology-unaware round-robin.
    #[default]
    Baseline,
    /// Hint-based topology-aware scoring.
    Htas,
    /// Behaviour-inference scoring (no hints consulted).
    Dynamic,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Baseline, PolicyKind::Htas, PolicyKind::Dynamic];

    pub fn label(self) -> &'static str {
        match self {
            PolicyKind::Baseline => "BASELINE",
            PolicyKind::Htas => "HTAS",
            PolicyKind::Dynamic => "DYNAMIC",
        }
    }

    pub fn index(self) -> usize {
        match self {
            PolicyKind::Baseline => 0,
            PolicyKind::Htas => 1,
            PolicyKind::Dynamic => 2,
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(PolicyKind::Baseline),
            "htas" => Ok(PolicyKind::Htas),
            "dynamic" => Ok(PolicyKind::Dynamic),
            other => Err(format!("unknown scheduler type: {other}")),
        }
    }
}

// ── Baseline: round-robin ─────────────────────────────────────────────────────

/// Round-robin selection.
///
/// Scans from the cursor, returning the first ready task not already claimed
/// on the current tick, together with the cursor value for the next call.
/// Returns `None` (idle) only when every ready task is already claimed.
pub fn select_round_robin(tasks: &[SimTask], cursor: usize) -> Option<(usize, usize)> {
    let n = tasks.len();
    if n == 0 {
        return None;
    }
    for attempts in 0..n {
        let idx = (cursor + attempts) % n;
        let task = &tasks[idx];
        if task.ready && !task.claimed {
            return Some((idx, (idx + 1) % n));
        }
    }
    None
}

// ── HTAS: hint-scored ─────────────────────────────────────────────────────────

/// Score one candidate for one CPU using its explicit hints.
fn hint_score(task: &SimTask, cpu: &CpuInfo, tick: u32, node_count: usize) -> i32 {
    let mut score = task.base_priority;

    score += match task.preferred_kind {
        CpuKind::Performance => {
            if cpu.kind == CpuKind::Performance {
                12
            } else {
                -8
            }
        }
        CpuKind::Efficiency => {
            if cpu.kind == CpuKind::Efficiency {
                12
            } else {
                -6
            }
        }
    };

    if (task.preferred_numa as usize) < node_count {
        score += if cpu.numa_node == task.preferred_numa { 8 } else { -6 };
    }

    if task.intent == TaskIntent::LowLatency {
        score += 15;
        if task.waiting_since_ready > 0 {
            score += 15;
        }
    }

    let age = tick.saturating_sub(task.last_scheduled_tick);
    score += (age / 4) as i32;
    score += task.priority_boost_aging;

    score
}

/// Hint-scored selection: maximum score wins, ties broken by lowest index.
pub fn select_hint_scored(
    tasks: &[SimTask],
    cpu: &CpuInfo,
    tick: u32,
    node_count: usize,
) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (idx, task) in tasks.iter().enumerate() {
        if !task.ready || task.claimed {
            continue;
        }
        let score = hint_score(task, cpu, tick, node_count);
        if best.map(|(_, b)| score > b).unwrap_or(true) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

// ── Dynamic: inference-scored ─────────────────────────────────────────────────

/// Score one candidate for one CPU using inferred behaviour only.
///
/// Identical structure to [`hint_score`] with inferred inputs in place of
/// hints.  Low-latency intent cannot be identified a priori; a small bonus
/// goes to any task that woke recently instead.
fn inference_score(task: &SimTask, cpu: &CpuInfo, tick: u32) -> i32 {
    let mut score = task.base_priority;

    if task.recent_cpu_ticks > DYNAMIC_LOAD_THRESHOLD {
        // Behaves like a performance task.
        score += if cpu.kind == CpuKind::Performance { 12 } else { -8 };
    } else {
        // Behaves like an efficiency task.
        score += if cpu.kind == CpuKind::Efficiency { 12 } else { -6 };
    }

    score += if cpu.numa_node == task.inferred_numa_node { 8 } else { -6 };

    if task.waiting_since_ready > 0 {
        score += 5;
    }

    let age = tick.saturating_sub(task.last_scheduled_tick);
    score += (age / 4) as i32;
    score += task.priority_boost_aging;

    score
}

/// Inference-scored selection: maximum score wins, ties broken by lowest
/// index.
pub fn select_inference_scored(tasks: &[SimTask], cpu: &CpuInfo, tick: u32) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (idx, task) in tasks.iter().enumerate() {
        if !task.ready || task.claimed {
            continue;
        }
        let score = inference_score(task, cpu, tick);
        if best.map(|(_, b)| score > b).unwrap_or(true) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimTask;
    use crate::topology::Topology;

    fn cpu(topo: &Topology, id: u8) -> CpuInfo {
        topo.cpu(id)
    }

    fn plain_task(name: &str, priority: i32) -> SimTask {
        let mut t = SimTask::new(name, TaskIntent::Default, CpuKind::Performance, 0, priority);
        t.ready = true;
        t
    }

    // ── Round-robin ───────────────────────────────────────────────────────────

    #[test]
    fn round_robin_walks_the_ready_set() {
        let mut tasks = vec![plain_task("a", 1), plain_task("b", 1), plain_task("c", 1)];
        let (first, cursor) = select_round_robin(&tasks, 0).unwrap();
        assert_eq!(first, 0);
        tasks[first].claimed = true;
        let (second, cursor) = select_round_robin(&tasks, cursor).unwrap();
        assert_eq!(second, 1);
        tasks[second].claimed = true;
        let (third, _) = select_round_robin(&tasks, cursor).unwrap();
        assert_eq!(third, 2);
    }

    #[test]
    fn round_robin_skips_claimed_and_not_ready() {
        let mut tasks = vec![plain_task("a", 1), plain_task("b", 1), plain_task("c", 1)];
        tasks[0].claimed = true;
        tasks[1].ready = false;
        let (idx, cursor) = select_round_robin(&tasks, 0).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn round_robin_idles_when_ready_set_exhausted() {
        let mut tasks = vec![plain_task("a", 1)];
        tasks[0].claimed = true;
        assert!(select_round_robin(&tasks, 0).is_none());
        assert!(select_round_robin(&[], 0).is_none());
    }

    // ── Hint scoring ──────────────────────────────────────────────────────────

    #[test]
    fn hint_score_rewards_matching_core_kind() {
        let topo = Topology::default();
        let mut perf = plain_task("p", 10);
        perf.preferred_kind = CpuKind::Performance;
        perf.preferred_numa = 0;
        // +12 on a P-core, −8 on an E-core; NUMA adds +8 / −6.
        assert_eq!(hint_score(&perf, &cpu(&topo, 0), 0, 2), 10 + 12 + 8);
        assert_eq!(hint_score(&perf, &cpu(&topo, 2), 0, 2), 10 - 8 - 6);

        let mut eff = plain_task("e", 10);
        eff.preferred_kind = CpuKind::Efficiency;
        eff.preferred_numa = 1;
        assert_eq!(hint_score(&eff, &cpu(&topo, 2), 0, 2), 10 + 12 + 8);
        assert_eq!(hint_score(&eff, &cpu(&topo, 0), 0, 2), 10 - 6 - 6);
    }

    #[test]
    fn hint_score_boosts_low_latency_and_waking_tasks() {
        let topo = Topology::default();
        let mut task = plain_task("ll", 10);
        task.intent = TaskIntent::LowLatency;
        task.preferred_kind = CpuKind::Performance;
        task.preferred_numa = 0;
        let resting = hint_score(&task, &cpu(&topo, 0), 0, 2);
        task.waiting_since_ready = 3;
        let waking = hint_score(&task, &cpu(&topo, 0), 0, 2);
        assert_eq!(waking - resting, 15);
        assert_eq!(resting, 10 + 12 + 8 + 15);
    }

    #[test]
    fn hint_score_ages_and_applies_aging_boost() {
        let topo = Topology::default();
        let mut task = plain_task("t", 10);
        task.preferred_kind = CpuKind::Performance;
        task.preferred_numa = 0;
        task.last_scheduled_tick = 0;
        let young = hint_score(&task, &cpu(&topo, 0), 4, 2);
        let old = hint_score(&task, &cpu(&topo, 0), 40, 2);
        assert_eq!(old - young, (40 - 4) / 4);

        task.priority_boost_aging = 5;
        assert_eq!(hint_score(&task, &cpu(&topo, 0), 40, 2), old + 5);
    }

    #[test]
    fn hint_score_skips_numa_term_for_invalid_preference() {
        let topo = Topology::default();
        let mut task = plain_task("t", 10);
        task.preferred_kind = CpuKind::Performance;
        task.preferred_numa = 255;
        assert_eq!(hint_score(&task, &cpu(&topo, 0), 0, 2), 10 + 12);
    }

    #[test]
    fn hint_selection_breaks_ties_by_lowest_index() {
        let topo = Topology::default();
        let mut a = plain_task("a", 10);
        let mut b = plain_task("b", 10);
        for t in [&mut a, &mut b] {
            t.preferred_kind = CpuKind::Performance;
            t.preferred_numa = 0;
        }
        let tasks = vec![a, b];
        assert_eq!(select_hint_scored(&tasks, &cpu(&topo, 0), 0, 2), Some(0));
    }

    #[test]
    fn hint_selection_skips_claimed_tasks() {
        let topo = Topology::default();
        let mut winner = plain_task("w", 50);
        winner.claimed = true;
        let runner_up = plain_task("r", 10);
        let tasks = vec![winner, runner_up];
        assert_eq!(select_hint_scored(&tasks, &cpu(&topo, 0), 0, 2), Some(1));
    }

    // ── Inference scoring ─────────────────────────────────────────────────────

    #[test]
    fn inference_score_classifies_by_recent_load() {
        let topo = Topology::default();
        let mut task = plain_task("t", 10);
        task.inferred_numa_node = 0;

        // Light load: treated as an efficiency task.
        task.recent_cpu_ticks = 0;
        assert_eq!(inference_score(&task, &cpu(&topo, 2), 0), 10 + 12 - 6);
        assert_eq!(inference_score(&task, &cpu(&topo, 0), 0), 10 - 6 + 8);

        // Heavy load: treated as a performance task.
        task.recent_cpu_ticks = DYNAMIC_LOAD_THRESHOLD + 1;
        assert_eq!(inference_score(&task, &cpu(&topo, 0), 0), 10 + 12 + 8);
        assert_eq!(inference_score(&task, &cpu(&topo, 2), 0), 10 - 8 - 6);
    }

    #[test]
    fn inference_score_uses_learned_numa_node() {
        let topo = Topology::default();
        let mut task = plain_task("t", 10);
        task.inferred_numa_node = 1;
        let on_node1 = inference_score(&task, &cpu(&topo, 2), 0);
        let off_node = inference_score(&task, &cpu(&topo, 0), 0);
        assert_eq!(on_node1 - off_node, (12 + 8) - (-6 + -6));
    }

    #[test]
    fn inference_score_gives_small_wake_bonus_only() {
        let topo = Topology::default();
        let mut task = plain_task("ll", 10);
        task.intent = TaskIntent::LowLatency; // intent must not be consulted
        let resting = inference_score(&task, &cpu(&topo, 0), 0);
        task.waiting_since_ready = 2;
        let waking = inference_score(&task, &cpu(&topo, 0), 0);
        assert_eq!(waking - resting, 5);
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn policy_parses_from_shell_argument() {
        assert_eq!("baseline".parse::<PolicyKind>().unwrap(), PolicyKind::Baseline);
        assert_eq!("htas".parse::<PolicyKind>().unwrap(), PolicyKind::Htas);
        assert_eq!("dynamic".parse::<PolicyKind>().unwrap(), PolicyKind::Dynamic);
        assert!("cfs".parse::<PolicyKind>().is_err());
    }
}
