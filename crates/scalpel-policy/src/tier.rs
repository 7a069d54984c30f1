//! Tier limit bundles (spec.md §4.8): a tier is a named bundle of
//! `limit` rules; no rule references a tier directly, tiers only
//! select which bundle of limits applies.

use crate::rule::Rule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierBundle {
    pub name: String,
    /// `(field, max)` pairs, expanded into `Rule::limit` at evaluation time.
    pub limits: Vec<(String, u64)>,
}

impl TierBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), limits: Vec::new() }
    }

    pub fn with_limit(mut self, field: impl Into<String>, max: u64) -> Self {
        self.limits.push((field.into(), max));
        self
    }

    pub fn as_rules(&self) -> Vec<Rule> {
        self.limits
            .iter()
            .map(|(field, max)| Rule::limit(format!("{}:{field}", self.name), field.clone(), *max))
            .collect()
    }
}

/// The tiers named in SPEC_FULL.md's ambient config, mirrored from
/// `scalpel_core::config::Preset` (`fast`/`balanced`/`thorough` maps
/// roughly to `free`/`standard`/`unlimited` access scope). `community`
/// is the public-crawl tier from spec.md §8's S6 scenario: a hard cap
/// on how many files a single crawl-style request may read.
pub fn default_bundles() -> Vec<TierBundle> {
    vec![
        TierBundle::new("free")
            .with_limit("max_file_size_bytes", 256 * 1024)
            .with_limit("max_graph_depth", 2)
            .with_limit("modules_scanned", 20)
            .with_limit("findings_returned", 50),
        TierBundle::new("community")
            .with_limit("max_file_size_bytes", 256 * 1024)
            .with_limit("max_graph_depth", 2)
            .with_limit("max_files", 100)
            .with_limit("findings_returned", 50),
        TierBundle::new("standard")
            .with_limit("max_file_size_bytes", 4 * 1024 * 1024)
            .with_limit("max_graph_depth", 6)
            .with_limit("modules_scanned", 500)
            .with_limit("findings_returned", 500),
        TierBundle::new("unlimited")
            .with_limit("max_file_size_bytes", u64::MAX)
            .with_limit("max_graph_depth", 64)
            .with_limit("modules_scanned", u64::MAX)
            .with_limit("findings_returned", u64::MAX),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_expands_to_one_limit_rule_per_entry() {
        let bundle = TierBundle::new("free").with_limit("modules_scanned", 20);
        let rules = bundle.as_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "free:modules_scanned");
    }

    #[test]
    fn default_bundles_cover_the_named_tiers() {
        let names: Vec<_> = default_bundles().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["free", "community", "standard", "unlimited"]);
    }

    #[test]
    fn community_tier_caps_max_files_at_one_hundred() {
        let bundle = default_bundles().into_iter().find(|b| b.name == "community").unwrap();
        assert_eq!(bundle.limits.iter().find(|(f, _)| f == "max_files").map(|(_, m)| *m), Some(100));
    }
}
