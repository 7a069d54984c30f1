//! Engine configuration (ambient stack, SPEC_FULL.md).
//!
//! A single preset-first, override-second struct, following the
//! teacher's `config::PipelineConfig` Level-1/Level-2 split
//! (`codegraph-ir/src/config/mod.rs`) scaled to this workspace's
//! components. Configuration, secrets, and the policy manifest are all
//! loaded into an immutable object at startup and only reloaded on
//! explicit signal (spec.md §9 "Global mutable state").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Small worker pool, shallow symbolic/taint bounds — interactive use.
    Fast,
    /// Default balance of depth and latency.
    Balanced,
    /// Deep symbolic execution and unlimited-looking k-hop (tier limits
    /// still apply; see spec.md §9 "Open questions").
    Thorough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub sniff_bytes: usize,
    pub ignore_dirs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sniff_bytes: 4096,
            ignore_dirs: vec![
                ".git".into(),
                ".hg".into(),
                ".svn".into(),
                "node_modules".into(),
                "target".into(),
                "dist".into(),
                "build".into(),
                ".venv".into(),
                "__pycache__".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub memory_budget_bytes: u64,
    pub mmap_threshold_bytes: u64,
    pub disk_compaction_tombstone_ratio: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: 256 * 1024 * 1024,
            mmap_threshold_bytes: 1024 * 1024,
            disk_compaction_tombstone_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub confidence_threshold: f32,
    pub default_k_hop_max_nodes: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            default_k_hop_max_nodes: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolicConfig {
    pub max_depth: usize,
    pub max_states: usize,
    pub wall_clock_budget_ms: u64,
    pub weight_sink: f64,
    pub weight_complexity: f64,
    pub weight_depth: f64,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_states: 4096,
            wall_clock_budget_ms: 5_000,
            weight_sink: 2.0,
            weight_complexity: 0.5,
            weight_depth: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub preset: Preset,
    pub ingest: IngestConfig,
    pub cache: CacheConfig,
    pub graph: GraphConfig,
    pub symbolic: SymbolicConfig,
    pub worker_threads: usize,
}

impl EngineConfig {
    /// Level 1 (90% use case): a one-liner preset.
    pub fn preset(preset: Preset) -> Self {
        let mut cfg = Self {
            preset,
            ingest: IngestConfig::default(),
            cache: CacheConfig::default(),
            graph: GraphConfig::default(),
            symbolic: SymbolicConfig::default(),
            worker_threads: num_cpus_fallback(),
        };
        match preset {
            Preset::Fast => {
                cfg.symbolic.max_depth = 16;
                cfg.symbolic.max_states = 256;
                cfg.symbolic.wall_clock_budget_ms = 500;
            }
            Preset::Balanced => {}
            Preset::Thorough => {
                cfg.symbolic.max_depth = 256;
                cfg.symbolic.max_states = 65_536;
                cfg.symbolic.wall_clock_budget_ms = 60_000;
            }
        }
        cfg
    }

    /// Level 2 (9% use case): override the symbolic-stage bounds while
    /// keeping everything else from the chosen preset.
    pub fn with_symbolic(mut self, f: impl FnOnce(SymbolicConfig) -> SymbolicConfig) -> Self {
        self.symbolic = f(self.symbolic);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

/// `min(CPUs, configured_max)` per spec.md §5; the core has no
/// dependency on `num_cpus` at this layer (kept in ingest/parse crates
/// where it matters), so this falls back to an env hint or 4 threads.
fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
