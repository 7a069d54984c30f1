//! The policy engine: admits or rejects a request by checking manifest
//! integrity first (fail closed), then the active rule set plus the
//! requester's tier bundle (spec.md §4.8).

use crate::error::PolicyError;
use crate::manifest::PolicyManifest;
use crate::rule::{evaluate, RequestContext, Rule};
use crate::tier::TierBundle;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct PolicyEngine {
    rules: Vec<Rule>,
    tiers: HashMap<String, TierBundle>,
    manifest: PolicyManifest,
    manifest_root: PathBuf,
    secret: Vec<u8>,
    manifest_valid: bool,
}

impl PolicyEngine {
    /// Loads the engine and verifies the manifest once up front, per
    /// spec.md §4.8 "On startup ... the engine verifies". A later
    /// [`PolicyEngine::reload`] re-runs the same check.
    pub fn load(
        rules: Vec<Rule>,
        tiers: Vec<TierBundle>,
        manifest: PolicyManifest,
        manifest_root: impl Into<PathBuf>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        let manifest_root = manifest_root.into();
        let secret = secret.into();
        let manifest_valid = manifest.verify(&manifest_root, &secret).is_ok();
        Self {
            rules,
            tiers: tiers.into_iter().map(|t| (t.name.clone(), t)).collect(),
            manifest,
            manifest_root,
            secret,
            manifest_valid,
        }
    }

    /// Re-verify the manifest against the current on-disk state,
    /// e.g. after an operator re-signs or restores it.
    pub fn reload(&mut self) {
        self.manifest_valid = self.manifest.verify(&self.manifest_root, &self.secret).is_ok();
    }

    pub fn is_manifest_valid(&self) -> bool {
        self.manifest_valid
    }

    /// Admit a request: every active rule must pass, then the rules
    /// implied by the requester's tier bundle. Runs on every tool call
    /// (spec.md §4.8, §4.9).
    pub fn admit(&self, ctx: &RequestContext) -> Result<(), PolicyError> {
        if !self.manifest_valid {
            return Err(PolicyError::ManifestInvalid);
        }
        for rule in &self.rules {
            evaluate(rule, ctx)?;
        }
        if let Some(bundle) = self.tiers.get(&ctx.tier) {
            for rule in bundle.as_rules() {
                evaluate(&rule, ctx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PolicyFileEntry;
    use crate::rule::Predicate;
    use crate::tier::TierBundle;
    use chrono::Utc;
    use scalpel_core::graph::EdgeKind;
    use sha2::{Digest, Sha256};

    fn hash_hex(bytes: &[u8]) -> String {
        let digest: [u8; 32] = Sha256::digest(bytes).into();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn engine_with_manifest(dir: &std::path::Path, secret: &[u8]) -> PolicyEngine {
        std::fs::write(dir.join("rules.json"), b"{}").unwrap();
        let entry = PolicyFileEntry {
            path: PathBuf::from("rules.json"),
            sha256: hash_hex(b"{}"),
            created_at: Utc::now(),
        };
        let manifest = PolicyManifest::signed(vec![entry], secret);
        PolicyEngine::load(
            vec![Rule::forbid("no-calls", Predicate::EdgeKind(EdgeKind::DirectCall))],
            vec![TierBundle::new("free").with_limit("modules_scanned", 5)],
            manifest,
            dir,
            secret.to_vec(),
        )
    }

    #[test]
    fn valid_manifest_and_passing_rules_admit_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_manifest(dir.path(), b"secret");
        assert!(engine.is_manifest_valid());
        let ctx = RequestContext { tier: "free".into(), ..Default::default() };
        assert!(engine.admit(&ctx).is_ok());
    }

    #[test]
    fn tampered_manifest_denies_every_request() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_manifest(dir.path(), b"secret");
        std::fs::write(dir.path().join("rules.json"), b"{\"x\":1}").unwrap();

        let mut engine = engine;
        engine.reload();
        assert!(!engine.is_manifest_valid());
        let ctx = RequestContext { tier: "free".into(), ..Default::default() };
        assert!(matches!(engine.admit(&ctx), Err(PolicyError::ManifestInvalid)));
    }

    #[test]
    fn forbidden_edge_kind_rejects_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_manifest(dir.path(), b"secret");
        let ctx = RequestContext {
            tier: "free".into(),
            edge_kinds: vec![EdgeKind::DirectCall],
            ..Default::default()
        };
        assert!(engine.admit(&ctx).is_err());
    }

    #[test]
    fn tier_limit_rejects_over_budget_request() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_manifest(dir.path(), b"secret");
        let mut ctx = RequestContext { tier: "free".into(), ..Default::default() };
        ctx.fields.insert("modules_scanned".into(), serde_json::json!(50));
        assert!(engine.admit(&ctx).is_err());
    }
}
