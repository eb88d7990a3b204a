/*
SPDX-License-Identifier: MIT
*/

//! HTAS – hint-based topology-aware scheduling core (Rust port)
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── topology/   – fixed CPU + NUMA machine model, locality queries
//! ├── config/     – optional YAML topology override file
//! ├── task/       – intent profiles, per-task scheduler state, set_profile
//! ├── policy/     – the three pure selection policies
//! ├── sim/        – tick-driven simulation driver, accounting, fixed workload
//! ├── stats/      – per-policy statistics records
//! ├── report/     – textual rendering of topology, stats and comparisons
//! ├── aging/      – shared anti-starvation wait clock
//! └── kthread/    – preemptive kernel-thread scheduler (real context switches)
//! ```
//!
//! The simulator compares three policies — round-robin (`Baseline`),
//! hint-driven (`Htas`) and behaviour-inferring (`Dynamic`) — against one
//! mixed synthetic workload on a simulated asymmetric multi-core NUMA
//! machine, and produces byte-identical statistics for identical inputs.

pub mod aging;
pub mod config;
pub mod kthread;
pub mod policy;
pub mod report;
pub mod sim;
pub mod stats;
pub mod task;
pub mod topology;
