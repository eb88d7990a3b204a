//! Textual rendering of topology, statistics and comparisons.
//!
//! Everything user-facing is built as a `String` so the command surface can
//! print it and tests can assert on it.  Diagnostics go through `tracing`,
//! never through these renderers.

use std::fmt::Write;

use crate::policy::{PolicyKind, DYNAMIC_INFERENCE_WINDOW, DYNAMIC_LOAD_THRESHOLD};
use crate::sim::{
    AGING_PRIORITY_BOOST, AGING_THRESHOLD, ECORE_SLOWDOWN_FACTOR, NUMA_PENALTY_CYCLES,
};
use crate::stats::SchedulerStats;
use crate::task::{TaskIntent, LOW_LATENCY_PRIORITY_BOOST};
use crate::topology::Topology;

const RULE: &str = "========================================";

/// Integer percentage reduction from `a` to `b` (0 when `a` is zero).
fn reduction_pct(a: u64, b: u64) -> i64 {
    if a == 0 {
        return 0;
    }
    ((a as i64 - b as i64) * 100) / a as i64
}

/// The `htas` command: topology, NUMA regions, simulation parameters and the
/// active policy.
pub fn render_topology(topology: &Topology, active: PolicyKind) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "        HTAS HARDWARE TOPOLOGY");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Simulated Hardware Configuration:");
    let _ = writeln!(out, "  Total CPUs: {}", topology.cpu_count());
    let _ = writeln!(out, "  NUMA Nodes: {}", topology.node_count());
    let _ = writeln!(out);
    let _ = writeln!(out, "CPU Topology:");
    for cpu in topology.cpus() {
        let _ = writeln!(
            out,
            "  CPU {}: {:<8} NUMA Node {}  [{}]",
            cpu.cpu_id,
            cpu.kind.label(),
            cpu.numa_node,
            if cpu.online { "ONLINE" } else { "OFFLINE" },
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "NUMA Memory Regions:");
    for (node, region) in topology.regions().iter().enumerate() {
        let _ = writeln!(
            out,
            "  Node {}: {:#010x} - {:#010x} ({} MiB)",
            node,
            region.base,
            region.end().saturating_sub(1),
            region.size / (1024 * 1024),
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Simulation Parameters:");
    let _ = writeln!(out, "  E-Core Slowdown: {ECORE_SLOWDOWN_FACTOR}x");
    let _ = writeln!(out, "  NUMA Penalty: {NUMA_PENALTY_CYCLES} cycles (cross-node access)");
    let _ = writeln!(out, "  LOW_LATENCY Priority Boost: +{LOW_LATENCY_PRIORITY_BOOST}");
    let _ = writeln!(out, "  AGING Threshold: {AGING_THRESHOLD} ticks");
    let _ = writeln!(out, "  AGING Priority Boost: +{AGING_PRIORITY_BOOST}");
    let _ = writeln!(out, "  DYNAMIC Load Window: {DYNAMIC_INFERENCE_WINDOW} ticks");
    let _ = writeln!(out, "  DYNAMIC Load Threshold: {DYNAMIC_LOAD_THRESHOLD} ticks");
    let _ = writeln!(out);
    let _ = writeln!(out, "Task Intent Profiles:");
    let _ = writeln!(out, "  PERFORMANCE  -> Prefers P-cores, maximizes throughput");
    let _ = writeln!(out, "  EFFICIENCY   -> Prefers E-cores, minimizes power");
    let _ = writeln!(out, "  LOW_LATENCY  -> Requires P-cores + priority boost");
    let _ = writeln!(out, "  DEFAULT      -> No restrictions (any core)");
    let _ = writeln!(out);
    let _ = writeln!(out, "Current Scheduler: {}", active.label());
    out
}

/// One policy's statistics block.
pub fn render_stats(stats: &SchedulerStats, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " {name} SCHEDULER STATISTICS");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Total ticks:           {}", stats.total_ticks);
    let _ = writeln!(out, "Context switches:      {}", stats.context_switches);
    let _ = writeln!(out, "NUMA penalties:        {}", stats.numa_penalties);
    let _ = writeln!(out, "P-core time:           {} us", stats.pcore_time_us);
    let _ = writeln!(out, "E-core time:           {} us", stats.ecore_time_us);
    let _ = writeln!(out, "Power consumption:     {} units", stats.total_power_consumption);
    let _ = writeln!(out);
    let _ = writeln!(out, "Per-Intent Statistics:");
    for (intent, slot) in stats.intent.iter() {
        if slot.switches == 0 {
            continue;
        }
        let _ = writeln!(out, "  {}:", intent.label());
        let _ = writeln!(out, "    Runtime:      {} us", slot.runtime_us);
        let _ = writeln!(out, "    Switches:     {}", slot.switches);
        if intent == TaskIntent::LowLatency {
            let _ = writeln!(out, "    Avg Latency:  {} us", slot.avg_latency_us);
            let _ = writeln!(out, "    Max Jitter:   {} us", slot.max_jitter_us);
        }
    }
    let _ = writeln!(out, "{RULE}");
    out
}

/// Pairwise comparison of two policies' records.
pub fn render_comparison(
    a: &SchedulerStats,
    name_a: &str,
    b: &SchedulerStats,
    name_b: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " {name_a} vs {name_b} COMPARISON");
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "NUMA Penalties:");
    let _ = writeln!(out, "  {name_a}: {}", a.numa_penalties);
    let _ = writeln!(out, "  {name_b}: {}", b.numa_penalties);
    let _ = writeln!(
        out,
        "  {name_b} Improvement: {}% reduction",
        reduction_pct(a.numa_penalties, b.numa_penalties)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Power Consumption:");
    let _ = writeln!(out, "  {name_a}: {} units", a.total_power_consumption);
    let _ = writeln!(out, "  {name_b}: {} units", b.total_power_consumption);
    let _ = writeln!(
        out,
        "  {name_b} Improvement: {}% reduction",
        reduction_pct(a.total_power_consumption, b.total_power_consumption)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Context Switches:");
    let _ = writeln!(out, "  {name_a}: {}", a.context_switches);
    let _ = writeln!(out, "  {name_b}: {}", b.context_switches);

    let _ = writeln!(out);
    let _ = writeln!(out, "LOW_LATENCY Task Performance:");
    let _ = writeln!(
        out,
        "  {name_a} Max Jitter: {} us",
        a.intent[TaskIntent::LowLatency].max_jitter_us
    );
    let _ = writeln!(
        out,
        "  {name_b} Max Jitter: {} us",
        b.intent[TaskIntent::LowLatency].max_jitter_us
    );
    let _ = writeln!(out, "{RULE}");
    out
}

// ── Aging demonstration ───────────────────────────────────────────────────────

const AGING_DEMO_BULLY_PRIORITY: i32 = 10;
const AGING_DEMO_VICTIM_PRIORITY: i32 = 5;
const AGING_DEMO_THRESHOLD: u32 = 50;
const AGING_DEMO_BOOST: i32 = 10;
const AGING_DEMO_TICKS: u32 = 500;

/// Standalone anti-starvation walkthrough: a high-priority bully against a
/// low-priority victim on one CPU, with the aging boost as the only fairness
/// mechanism.
pub fn render_aging_demo() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, " AGING (ANTI-STARVATION) DEMONSTRATION");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Bully priority {AGING_DEMO_BULLY_PRIORITY}, victim priority {AGING_DEMO_VICTIM_PRIORITY}"
    );
    let _ = writeln!(
        out,
        "Aging threshold: {AGING_DEMO_THRESHOLD} ticks, aging boost: +{AGING_DEMO_BOOST}"
    );
    let _ = writeln!(out, "Running {AGING_DEMO_TICKS} ticks...");

    let mut victim_wait = 0u32;
    let mut victim_boost = 0i32;
    let mut victim_runs = 0u32;
    let mut starvation_reported = false;

    for tick in 0..AGING_DEMO_TICKS {
        let victim_total = AGING_DEMO_VICTIM_PRIORITY + victim_boost;
        if AGING_DEMO_BULLY_PRIORITY >= victim_total {
            victim_wait += 1;
            if victim_wait > AGING_DEMO_THRESHOLD {
                victim_boost = AGING_DEMO_BOOST;
                if !starvation_reported {
                    let _ = writeln!(out, "[tick {tick}] victim starvation detected");
                    let _ = writeln!(
                        out,
                        "[tick {tick}] applying aging boost: victim priority {} -> {}",
                        AGING_DEMO_VICTIM_PRIORITY,
                        AGING_DEMO_VICTIM_PRIORITY + AGING_DEMO_BOOST
                    );
                    starvation_reported = true;
                }
            }
        } else {
            victim_runs += 1;
            if victim_runs == 1 {
                let _ = writeln!(out, "[tick {tick}] victim runs, starvation broken");
            }
            victim_wait = 0;
            victim_boost = 0;
        }
    }

    if victim_runs > 0 {
        let _ = writeln!(out, "RESULT: SUCCESS, victim ran {victim_runs} times");
    } else {
        let _ = writeln!(out, "RESULT: FAILURE, victim starved");
    }
    let _ = writeln!(out, "{RULE}");
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
