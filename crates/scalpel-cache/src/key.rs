//! `CacheKey = SHA256(file_content) ⊕ analyzer_version ⊕ config_hash`
//! (spec.md §3 "Cache Entry"). XOR-folding the three components into one
//! digest keeps the key a plain 32-byte array usable as a map key and as
//! a filename stem, the way the teacher's `CacheKey` does for its own
//! (file_id, fingerprint) pair.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(pub [u8; 32]);

impl CacheKey {
    pub fn new(content_hash: &[u8; 32], analyzer_version: u32, config_hash: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content_hash);
        hasher.update(analyzer_version.to_le_bytes());
        hasher.update(config_hash.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash of a serialized `EngineConfig`, used as the third component of
/// `CacheKey` so a changed analysis configuration invalidates entries
/// without touching file content.
pub fn config_hash(config_bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(config_bytes);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_key() {
        let h = [7u8; 32];
        assert_eq!(CacheKey::new(&h, 1, 42), CacheKey::new(&h, 1, 42));
    }

    #[test]
    fn different_analyzer_version_changes_key() {
        let h = [7u8; 32];
        assert_ne!(CacheKey::new(&h, 1, 42), CacheKey::new(&h, 2, 42));
    }

    #[test]
    fn different_config_hash_changes_key() {
        let h = [7u8; 32];
        assert_ne!(CacheKey::new(&h, 1, 42), CacheKey::new(&h, 1, 43));
    }
}
