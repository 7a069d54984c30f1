//! Cache & Incremental Analyzer (spec.md §4.4): a two-tier (memory LRU
//! + disk) cache keyed by content hash, with reverse-dependency-aware
//! invalidation. Grounded on the teacher's `features/cache` module,
//! collapsed from its three tiers (L0/L1/L2) to the two spec.md calls
//! for, and made synchronous since nothing else in this workspace pulls
//! in an async runtime.

pub mod disk;
pub mod error;
pub mod key;
pub mod memory;
pub mod reverse_deps;

pub use disk::DiskTier;
pub use error::CacheError;
pub use key::{config_hash, CacheKey};
pub use memory::MemoryTier;
pub use reverse_deps::ReverseDeps;

use dashmap::DashMap;
use scalpel_core::error::ScalpelError;
use scalpel_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MMAP_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// Bytes-on-memory budget below which entries are never written to
/// disk; defaults to 256 MiB, matching a conservative workstation
/// memory profile.
pub const DEFAULT_MEMORY_BUDGET_BYTES: usize = 256 * 1024 * 1024;

pub struct Cache<V> {
    memory: MemoryTier<V>,
    disk: DiskTier,
    reverse_deps: ReverseDeps,
    /// path -> keys cached for that path, so `invalidate(path)` knows
    /// which cache entries to drop.
    path_index: DashMap<PathBuf, HashSet<CacheKey>>,
}

impl<V> Cache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn open(disk_dir: &Path, memory_budget_bytes: usize) -> Result<Self> {
        let disk = DiskTier::open(disk_dir).map_err(ScalpelError::from)?;
        Ok(Self {
            memory: MemoryTier::new(memory_budget_bytes),
            disk,
            reverse_deps: ReverseDeps::new(),
            path_index: DashMap::new(),
        })
    }

    /// Memoized lookup: on a hit, `compute` is never invoked (spec.md
    /// invariant #6).
    pub fn get_or_compute<F>(&self, path: &Path, key: CacheKey, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.memory.get(&key) {
            return Ok(value);
        }

        if let Some(value) = self.disk.get::<V>(&key).map_err(ScalpelError::from)? {
            let value = Arc::new(value);
            let size = estimated_size(&value);
            self.memory.insert(key, value.clone(), size);
            self.bind_path(path, key);
            return Ok(value);
        }

        let computed = compute()?;
        let value = Arc::new(computed);
        self.store_internal(path, key, &value)?;
        Ok(value)
    }

    /// Write-through store to memory and disk (spec.md §4.4).
    pub fn store(&self, path: &Path, key: CacheKey, value: V) -> Result<Arc<V>> {
        let value = Arc::new(value);
        self.store_internal(path, key, &value)?;
        Ok(value)
    }

    fn store_internal(&self, path: &Path, key: CacheKey, value: &Arc<V>) -> Result<()> {
        self.disk.set(&key, value.as_ref()).map_err(ScalpelError::from)?;
        let size = estimated_size(value);
        self.memory.insert(key, value.clone(), size);
        self.bind_path(path, key);
        Ok(())
    }

    fn bind_path(&self, path: &Path, key: CacheKey) {
        self.path_index
            .entry(path.to_path_buf())
            .or_default()
            .insert(key);
    }

    /// Record that `dependent` reads/imports `depends_on`, feeding the
    /// reverse-dependency closure used by `invalidate`.
    pub fn record_dependency(&self, dependent: PathBuf, depends_on: PathBuf) {
        self.reverse_deps.record_dependency(dependent, depends_on);
    }

    /// Evict `path` and everything that transitively depends on it,
    /// returning the full set of evicted paths (spec.md §4.4).
    pub fn invalidate(&self, path: &Path) -> HashSet<PathBuf> {
        let closure = self.reverse_deps.closure(&path.to_path_buf());

        for affected in &closure {
            if let Some((_, keys)) = self.path_index.remove(affected) {
                for key in keys {
                    self.memory.invalidate(&key);
                    let _ = self.disk.invalidate(&key);
                }
            }
            self.reverse_deps.forget_path(affected);
        }

        closure
    }

    pub fn bytes_in_memory(&self) -> usize {
        self.memory.bytes_used()
    }
}

fn estimated_size<V: Serialize>(value: &V) -> usize {
    bincode::serialized_size(value).unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn cache_hit_never_invokes_compute() {
        let dir = TempDir::new().unwrap();
        let cache: Cache<String> = Cache::open(dir.path(), DEFAULT_MEMORY_BUDGET_BYTES).unwrap();
        let path = PathBuf::from("a.py");
        let key = CacheKey::new(&[1; 32], 1, 0);

        let calls = Cell::new(0);
        cache
            .get_or_compute(&path, key, || {
                calls.set(calls.get() + 1);
                Ok("computed".to_string())
            })
            .unwrap();
        cache
            .get_or_compute(&path, key, || {
                calls.set(calls.get() + 1);
                Ok("computed-again".to_string())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_evicts_transitive_dependents() {
        let dir = TempDir::new().unwrap();
        let cache: Cache<String> = Cache::open(dir.path(), DEFAULT_MEMORY_BUDGET_BYTES).unwrap();

        let a = PathBuf::from("a.py");
        let b = PathBuf::from("b.py");
        cache.record_dependency(b.clone(), a.clone());

        let key_a = CacheKey::new(&[1; 32], 1, 0);
        let key_b = CacheKey::new(&[2; 32], 1, 0);
        cache.store(&a, key_a, "a-value".to_string()).unwrap();
        cache.store(&b, key_b, "b-value".to_string()).unwrap();

        let evicted = cache.invalidate(&a);
        assert!(evicted.contains(&a));
        assert!(evicted.contains(&b));

        let calls = Cell::new(0);
        cache
            .get_or_compute(&a, key_a, || {
                calls.set(calls.get() + 1);
                Ok("recomputed".to_string())
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn store_is_readable_after_memory_eviction() {
        let dir = TempDir::new().unwrap();
        // Tiny memory budget forces every entry straight to disk-only residency.
        let cache: Cache<String> = Cache::open(dir.path(), 1).unwrap();
        let path = PathBuf::from("a.py");
        let key = CacheKey::new(&[1; 32], 1, 0);
        cache.store(&path, key, "value".to_string()).unwrap();

        let calls = Cell::new(0);
        let value = cache
            .get_or_compute(&path, key, || {
                calls.set(calls.get() + 1);
                Ok("should-not-run".to_string())
            })
            .unwrap();
        assert_eq!(*value, "value");
        assert_eq!(calls.get(), 0);
    }
}
