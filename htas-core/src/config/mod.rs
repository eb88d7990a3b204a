//! Optional topology override file.
//!
//! The machine model is fixed configuration data; the built-in default
//! (`Topology::default`) is what every command uses.  For experiments a YAML
//! file can declare a different machine:
//!
//! ```yaml
//! cpus:
//!   - kind: performance
//!     numa_node: 0
//!   - kind: efficiency
//!     numa_node: 1
//! numa_regions:
//!   - base: 0
//!     size: 134217728
//!   - base: 134217728
//!     size: 134217728
//! ```
//!
//! CPU ids are assigned densely in declaration order.  A file that parses but
//! declares no CPUs falls back to the default machine with a warning.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::topology::{CpuKind, NumaRegion, Topology, NUMA_REGION_SIZE};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.  Callers
/// work with [`Topology`] instead.
#[derive(Debug, Deserialize)]
struct TopologyFile {
    #[serde(default)]
    cpus: Vec<CpuEntry>,
    #[serde(default)]
    numa_regions: Vec<NumaRegion>,
}

#[derive(Debug, Deserialize)]
struct CpuEntry {
    kind: CpuKind,
    #[serde(default)]
    numa_node: u8,
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parse `path` into a [`Topology`].
///
/// # Errors
/// Returns an error if the file cannot be opened or the YAML is structurally
/// invalid.  Semantic gaps (no CPUs, no regions) fall back to the defaults.
pub fn load_topology(path: &Path) -> Result<Topology> {
    info!("Loading topology override from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open topology file: {}", path.display()))?;

    let file: TopologyFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

    if file.cpus.is_empty() {
        warn!("No CPUs declared in topology file, using default machine");
        return Ok(Topology::default());
    }

    let regions = if file.numa_regions.is_empty() {
        warn!("No NUMA regions declared, using default regions");
        vec![
            NumaRegion { base: 0, size: NUMA_REGION_SIZE },
            NumaRegion { base: NUMA_REGION_SIZE, size: NUMA_REGION_SIZE },
        ]
    } else {
        file.numa_regions
    };

    for (i, cpu) in file.cpus.iter().enumerate() {
        if (cpu.numa_node as usize) >= regions.len() {
            warn!(
                cpu = i,
                numa_node = cpu.numa_node,
                regions = regions.len(),
                "CPU declared on a NUMA node with no memory region"
            );
        }
        debug!(cpu = i, kind = cpu.kind.label(), numa_node = cpu.numa_node, "cpu declared");
    }

    let kinds: Vec<(CpuKind, u8)> = file.cpus.iter().map(|c| (c.kind, c.numa_node)).collect();
    let topology = Topology::new(&kinds, regions);

    info!(
        cpus = topology.cpu_count(),
        nodes = topology.node_count(),
        "topology override loaded"
    );
    Ok(topology)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
