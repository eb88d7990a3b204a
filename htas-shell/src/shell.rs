/*
SPDX-License-Identifier: MIT
*/

//! Command dispatch for the HTAS shell.
//!
//! The shell is an external collaborator of the scheduling core: it owns one
//! [`Shell`] context (topology, active policy, per-policy statistics records
//! and the kernel-thread scheduler) and maps command lines onto core
//! operations.  Line editing and history are deliberately out of scope — the
//! driver loop in `main.rs` reads plain lines.
//!
//! Every command produces its output as a `String` so tests can assert on
//! it; errors print usage and change no state.

use std::fmt::Write;

use thiserror::Error;
use tracing::info;

use htas_core::kthread::{KernelScheduler, ThreadState};
use htas_core::policy::PolicyKind;
use htas_core::report;
use htas_core::sim::{mixed_workload, Simulation};
use htas_core::stats::SchedulerStats;
use htas_core::topology::Topology;

/// Benchmark length for the single-policy commands, in seconds.
const SINGLE_BENCH_SECS: u32 = 30;

/// Benchmark length per phase of the full comparison, in seconds.
const FULL_BENCH_SECS: u32 = 15;

/// Simulated ticks per second (one tick per millisecond).
const TICKS_PER_SEC: u32 = 1000;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Command-surface failures.  Printing the error *is* the usage message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown scheduler type: {0} (valid: baseline, htas, dynamic)")]
    BadSchedulerType(String),

    #[error("spawn failed: {0}")]
    SpawnFailed(String),
}

// ── Shell context ─────────────────────────────────────────────────────────────

/// All state behind the command surface.
pub struct Shell {
    topology: Topology,
    policy: PolicyKind,
    /// Per-policy records, indexed by `PolicyKind::index`.  Each record is
    /// written only by its own policy's benchmark phases.
    records: [SchedulerStats; 3],
    kthreads: Box<KernelScheduler>,
    spawned: u32,
}

impl Shell {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            policy: PolicyKind::Baseline,
            records: Default::default(),
            kthreads: KernelScheduler::new(),
            spawned: 0,
        }
    }

    /// Execute one command line and return its output.
    ///
    /// Each dispatched line also drives one kernel-thread timer tick — the
    /// shell loop is this build's tick source, so spawned demo threads get
    /// CPU between commands.
    pub fn execute(&mut self, line: &str) -> Result<String, CommandError> {
        self.kthreads.tick();

        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(String::new());
        };
        let arg = words.next();

        match cmd {
            "help" => Ok(help_text()),
            "htas" => Ok(report::render_topology(&self.topology, self.policy)),
            "htas-baseline" => Ok(self.run_phase(PolicyKind::Baseline, SINGLE_BENCH_SECS)),
            "htas-test" => Ok(self.run_phase(PolicyKind::Htas, SINGLE_BENCH_SECS)),
            "htas-full" => Ok(self.run_full_benchmark()),
            "htas-stats" => {
                let record = &self.records[self.policy.index()];
                Ok(report::render_stats(record, self.policy.label()))
            }
            "htas-aging" => Ok(report::render_aging_demo()),
            "sched" => self.switch_policy(arg),
            "ps" => Ok(self.render_ps()),
            "spawn" => self.spawn_demo(),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    // ── Benchmarks ────────────────────────────────────────────────────────────

    /// Run one benchmark phase, store its record and render it.
    fn run_phase(&mut self, policy: PolicyKind, duration_secs: u32) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Running {} benchmark ===", policy.label());
        let _ = writeln!(out, "Duration: {duration_secs} seconds (simulated)");

        info!(policy = policy.label(), duration_secs, "benchmark phase start");
        self.records[policy.index()].reset();
        let stats = Simulation::run_policy(
            &self.topology,
            policy,
            mixed_workload(),
            duration_secs * TICKS_PER_SEC,
        );
        self.records[policy.index()] = stats.clone();
        info!(policy = policy.label(), "benchmark phase complete");

        out.push_str(&report::render_stats(&stats, policy.label()));
        out
    }

    /// Three phases back to back, then all pairwise comparisons.
    fn run_full_benchmark(&mut self) -> String {
        let mut out = String::new();
        for policy in PolicyKind::ALL {
            out.push_str(&self.run_phase(policy, FULL_BENCH_SECS));
        }

        let [baseline, htas, dynamic] = &self.records;
        out.push_str(&report::render_comparison(baseline, "BASELINE", htas, "HTAS"));
        out.push_str(&report::render_comparison(baseline, "BASELINE", dynamic, "DYNAMIC"));
        out.push_str(&report::render_comparison(htas, "HTAS", dynamic, "DYNAMIC"));
        out
    }

    // ── Policy switching ──────────────────────────────────────────────────────

    fn switch_policy(&mut self, arg: Option<&str>) -> Result<String, CommandError> {
        let Some(arg) = arg else {
            return Err(CommandError::Usage("sched {baseline|htas|dynamic}"));
        };
        let policy: PolicyKind = arg
            .parse()
            .map_err(|_| CommandError::BadSchedulerType(arg.to_string()))?;
        self.policy = policy;
        info!(policy = policy.label(), "scheduler switched");
        Ok(format!("Switched to {} scheduler\n", policy.label()))
    }

    // ── Kernel threads ────────────────────────────────────────────────────────

    fn render_ps(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "TID  STATE     PRI    NAME");
        for t in self.kthreads.snapshot() {
            let state = match t.state {
                ThreadState::Running => "RUNNING",
                ThreadState::Ready => "READY",
                ThreadState::Blocked => "BLOCKED",
                ThreadState::Unused => "UNUSED",
            };
            let _ = writeln!(
                out,
                "{:>3}  {:<8} {:<6} {}{}",
                t.tid,
                state,
                t.priority.label(),
                t.name,
                if t.is_current { " *" } else { "" },
            );
        }
        out
    }

    fn spawn_demo(&mut self) -> Result<String, CommandError> {
        self.spawned += 1;
        let name = format!("demo{}", self.spawned);
        let tag = name.clone();
        let tid = self
            .kthreads
            .spawn(&name, move |sr| {
                for i in 0..3 {
                    println!("[{tag}] tick {i}");
                    sr.yield_now();
                }
            })
            .map_err(|e| CommandError::SpawnFailed(e.to_string()))?;
        Ok(format!("spawned thread {tid} ({name})\n"))
    }
}

fn help_text() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Built-ins:");
    let _ = writeln!(out, "  help          - show this help");
    let _ = writeln!(out, "  ps            - list kernel threads");
    let _ = writeln!(out, "  spawn         - create a demo thread");
    let _ = writeln!(out, "  exit          - leave the shell");
    let _ = writeln!(out);
    let _ = writeln!(out, "HTAS scheduler:");
    let _ = writeln!(out, "  htas          - show CPU topology and NUMA configuration");
    let _ = writeln!(out, "  htas-baseline - run 30s benchmark with BASELINE (round-robin)");
    let _ = writeln!(out, "  htas-test     - run 30s benchmark with HTAS (topology-aware)");
    let _ = writeln!(out, "  htas-full     - run the full three-way comparison");
    let _ = writeln!(out, "  htas-stats    - show the active policy's statistics");
    let _ = writeln!(out, "  htas-aging    - run the anti-starvation demonstration");
    let _ = writeln!(out, "  sched TYPE    - switch scheduler (baseline, htas, dynamic)");
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
