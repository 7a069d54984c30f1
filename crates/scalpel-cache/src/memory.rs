//! In-process LRU tier (spec.md §4.4: "Memory tier is an LRU bounded by
//! a configurable byte budget"), grounded on the teacher's
//! `l1_adaptive_cache.rs` ARC-with-TTL design but collapsed to a plain
//! size-weighted LRU since this workspace carries `lru`, not `moka`.

use crate::key::CacheKey;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

struct Entry<V> {
    value: Arc<V>,
    size_bytes: usize,
}

pub struct MemoryTier<V> {
    inner: Mutex<LruCache<CacheKey, Entry<V>>>,
    byte_budget: usize,
    bytes_used: Mutex<usize>,
}

impl<V> MemoryTier<V> {
    pub fn new(byte_budget: usize) -> Self {
        Self {
            // Capacity is nominal (eviction is byte-driven below); the
            // cap keeps the backing Vec from growing unbounded on a
            // pathological run of zero-byte entries.
            inner: Mutex::new(LruCache::new(NonZeroUsize::new(1_000_000).unwrap())),
            byte_budget,
            bytes_used: Mutex::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let mut guard = self.inner.lock();
        guard.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: CacheKey, value: Arc<V>, size_bytes: usize) {
        let mut guard = self.inner.lock();
        let mut bytes_used = self.bytes_used.lock();

        if let Some(old) = guard.push(key, Entry { value, size_bytes }) {
            // `push` returns an evicted entry only when the nominal
            // capacity is hit; the size bookkeeping below handles the
            // byte budget independently of that.
            *bytes_used = bytes_used.saturating_sub(old.1.size_bytes);
        }
        *bytes_used += size_bytes;

        while *bytes_used > self.byte_budget {
            match guard.pop_lru() {
                Some((_, evicted)) => *bytes_used = bytes_used.saturating_sub(evicted.size_bytes),
                None => break,
            }
        }
    }

    pub fn invalidate(&self, key: &CacheKey) {
        let mut guard = self.inner.lock();
        let mut bytes_used = self.bytes_used.lock();
        if let Some(entry) = guard.pop(key) {
            *bytes_used = bytes_used.saturating_sub(entry.size_bytes);
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
        *self.bytes_used.lock() = 0;
    }

    pub fn bytes_used(&self) -> usize {
        *self.bytes_used.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> CacheKey {
        CacheKey::new(&[n; 32], 1, 0)
    }

    #[test]
    fn evicts_lru_when_over_budget() {
        let tier: MemoryTier<Vec<u8>> = MemoryTier::new(10);
        tier.insert(key(1), Arc::new(vec![0; 6]), 6);
        tier.insert(key(2), Arc::new(vec![0; 6]), 6);
        assert!(tier.get(&key(1)).is_none());
        assert!(tier.get(&key(2)).is_some());
        assert!(tier.bytes_used() <= 10);
    }

    #[test]
    fn get_promotes_recency() {
        let tier: MemoryTier<Vec<u8>> = MemoryTier::new(12);
        tier.insert(key(1), Arc::new(vec![0; 6]), 6);
        tier.insert(key(2), Arc::new(vec![0; 6]), 6);
        tier.get(&key(1));
        tier.insert(key(3), Arc::new(vec![0; 6]), 6);
        assert!(tier.get(&key(2)).is_none());
        assert!(tier.get(&key(1)).is_some());
    }
}
