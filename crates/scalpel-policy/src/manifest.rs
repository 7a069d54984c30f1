//! Signed policy manifest (spec.md §4.8, §6 "Policy manifest"):
//! `{policy file, sha256, created_at}` entries plus an HMAC over their
//! concatenation, keyed by an operator-provisioned secret. Verified on
//! startup and on every tool call; any mismatch fails the engine closed.

use crate::error::PolicyError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyFileEntry {
    pub path: PathBuf,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyManifest {
    pub files: Vec<PolicyFileEntry>,
    /// Hex-encoded HMAC-SHA256 over [`canonical_bytes`].
    pub signature: String,
}

/// The byte layout signed/verified: each entry's `path | sha256 |
/// created_at` joined by `\n`, entries joined by `\x1e` (record
/// separator) to avoid ambiguity if a path itself contains a newline.
fn canonical_bytes(files: &[PolicyFileEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, entry) in files.iter().enumerate() {
        if i > 0 {
            out.push(0x1e);
        }
        out.extend_from_slice(entry.path.to_string_lossy().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(entry.sha256.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(entry.created_at.to_rfc3339().as_bytes());
    }
    out
}

pub fn sign(files: &[PolicyFileEntry], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&canonical_bytes(files));
    let bytes = mac.finalize().into_bytes();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl PolicyManifest {
    pub fn signed(files: Vec<PolicyFileEntry>, secret: &[u8]) -> Self {
        let signature = sign(&files, secret);
        Self { files, signature }
    }

    /// Verify the manifest's own HMAC signature.
    pub fn verify_signature(&self, secret: &[u8]) -> Result<(), PolicyError> {
        let expected = sign(&self.files, secret);
        if constant_time_eq(expected.as_bytes(), self.signature.as_bytes()) {
            Ok(())
        } else {
            Err(PolicyError::ManifestInvalid)
        }
    }

    /// Verify every listed file still hashes to its recorded digest,
    /// resolving relative paths against `base_dir`.
    pub fn verify_file_hashes(&self, base_dir: &Path) -> Result<(), PolicyError> {
        for entry in &self.files {
            let full_path = base_dir.join(&entry.path);
            let bytes = std::fs::read(&full_path)?;
            let actual: [u8; 32] = Sha256::digest(&bytes).into();
            let actual_hex: String = actual.iter().map(|b| format!("{:02x}", b)).collect();
            if actual_hex != entry.sha256 {
                return Err(PolicyError::ManifestInvalid);
            }
        }
        Ok(())
    }

    /// Full admission check: signature, then every file hash. Fail
    /// closed on the first mismatch (spec.md §4.8).
    pub fn verify(&self, base_dir: &Path, secret: &[u8]) -> Result<(), PolicyError> {
        self.verify_signature(secret)?;
        self.verify_file_hashes(base_dir)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
