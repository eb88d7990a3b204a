//! The fixed mixed workload every benchmark phase runs against.
//!
//! Eight synthetic tasks exercising all three policies' decision points:
//! two CPU-bound performance tasks split across both NUMA nodes, four
//! duty-cycled background tasks, one periodic low-latency task, and one
//! cross-NUMA stress task that prefers E-cores on the remote node.

use crate::sim::SimTask;
use crate::task::TaskIntent;
use crate::topology::CpuKind;

/// Number of tasks in the fixed workload.
pub const SIM_TASK_COUNT: usize = 8;

/// Build the fixed mixed workload.
///
/// Identical task definitions produce byte-identical statistics across runs,
/// so this is also the seed for the end-to-end tests.
pub fn mixed_workload() -> Vec<SimTask> {
    let mut tasks = vec![
        SimTask::new("PERF0", TaskIntent::Performance, CpuKind::Performance, 0, 12),
        SimTask::new("PERF1", TaskIntent::Performance, CpuKind::Performance, 1, 11),
    ];

    for name in ["EFFI0", "EFFI1", "EFFI2", "EFFI3"] {
        tasks.push(
            SimTask::new(name, TaskIntent::Efficiency, CpuKind::Efficiency, 1, 10)
                .with_duty_cycle(5, 1),
        );
    }

    tasks.push(
        SimTask::new("LOW_LAT", TaskIntent::LowLatency, CpuKind::Performance, 0, 10)
            .with_period(16, 2),
    );

    // Cross-NUMA stress: background work pinned by preference to the remote
    // node's E-cores.
    tasks.push(SimTask::new("NUMA", TaskIntent::Efficiency, CpuKind::Efficiency, 1, 10));

    debug_assert_eq!(tasks.len(), SIM_TASK_COUNT);
    tasks
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_has_the_documented_shape() {
        let tasks = mixed_workload();
        assert_eq!(tasks.len(), SIM_TASK_COUNT);

        assert_eq!(tasks[0].name, "PERF0");
        assert_eq!(tasks[0].base_priority, 12);
        assert_eq!(tasks[0].preferred_numa, 0);

        assert_eq!(tasks[1].name, "PERF1");
        assert_eq!(tasks[1].base_priority, 11);
        assert_eq!(tasks[1].preferred_numa, 1);

        for t in &tasks[2..6] {
            assert_eq!(t.intent, TaskIntent::Efficiency);
            assert_eq!(t.preferred_kind, CpuKind::Efficiency);
            assert_eq!(t.duty_cycle, 5);
            assert_eq!(t.active_ticks, 1);
        }

        let low_lat = &tasks[6];
        assert_eq!(low_lat.intent, TaskIntent::LowLatency);
        assert_eq!(low_lat.period_ms, 16);
        assert_eq!(low_lat.work_ms, 2);

        let stress = &tasks[7];
        assert_eq!(stress.preferred_kind, CpuKind::Efficiency);
        assert_eq!(stress.preferred_numa, 1);
    }

    #[test]
    fn low_latency_task_releases_its_first_job_immediately() {
        let tasks = mixed_workload();
        // `time_since_release` starts at the period so the first prepare
        // releases a job at tick 0.
        assert_eq!(tasks[6].time_since_release, tasks[6].period_ms);
    }
}
