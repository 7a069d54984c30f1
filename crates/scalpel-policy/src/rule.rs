//! Declarative rule model (spec.md §4.8): predicates over a fixed
//! vocabulary, three effect verbs (`require`, `forbid`, `limit`).

use crate::error::PolicyError;
use scalpel_core::graph::EdgeKind;
use scalpel_core::symbol::SymbolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed predicate vocabulary a rule may test against a request:
/// symbol kinds present, edge kinds traversed, finding severities
/// surfaced, or an arbitrary request field (spec.md §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    SymbolKind(SymbolKind),
    EdgeKind(EdgeKind),
    FindingSeverityAtLeast(scalpel_core::finding::Severity),
    RequestField { field: String, equals: serde_json::Value },
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::SymbolKind(k) => write!(f, "symbol_kind={k}"),
            Predicate::EdgeKind(k) => write!(f, "edge_kind={k:?}"),
            Predicate::FindingSeverityAtLeast(s) => write!(f, "finding_severity>={s:?}"),
            Predicate::RequestField { field, equals } => write!(f, "request.{field}={equals}"),
        }
    }
}

/// The facts a single tool request presents for rule evaluation. The
/// dispatcher (`scalpel-dispatch`) populates this from the resolved
/// request plus whatever the target component has computed so far.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub tier: String,
    pub symbol_kinds: Vec<SymbolKind>,
    pub edge_kinds: Vec<EdgeKind>,
    pub finding_severities: Vec<scalpel_core::finding::Severity>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    Require(Predicate),
    Forbid(Predicate),
    /// `field` names a numeric entry in `RequestContext::fields`; the
    /// rule rejects the request if that value exceeds `max`.
    Limit { field: String, max: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub effect: Effect,
}

impl Rule {
    pub fn require(name: impl Into<String>, predicate: Predicate) -> Self {
        Self { name: name.into(), effect: Effect::Require(predicate) }
    }

    pub fn forbid(name: impl Into<String>, predicate: Predicate) -> Self {
        Self { name: name.into(), effect: Effect::Forbid(predicate) }
    }

    pub fn limit(name: impl Into<String>, field: impl Into<String>, max: u64) -> Self {
        Self { name: name.into(), effect: Effect::Limit { field: field.into(), max } }
    }
}

fn predicate_holds(predicate: &Predicate, ctx: &RequestContext) -> bool {
    match predicate {
        Predicate::SymbolKind(k) => ctx.symbol_kinds.contains(k),
        Predicate::EdgeKind(k) => ctx.edge_kinds.contains(k),
        Predicate::FindingSeverityAtLeast(s) => ctx.finding_severities.iter().any(|sev| sev <= s),
        Predicate::RequestField { field, equals } => ctx.fields.get(field) == Some(equals),
    }
}

/// Evaluate a single rule against a request context, returning the
/// structured violation naming the rule and the failing predicate
/// (spec.md §4.8: "named rule and the failing predicate").
pub fn evaluate(rule: &Rule, ctx: &RequestContext) -> Result<(), PolicyError> {
    match &rule.effect {
        Effect::Require(predicate) => {
            if !predicate_holds(predicate, ctx) {
                return Err(PolicyError::RuleViolated {
                    rule: rule.name.clone(),
                    predicate: format!("required but absent: {predicate}"),
                });
            }
        }
        Effect::Forbid(predicate) => {
            if predicate_holds(predicate, ctx) {
                return Err(PolicyError::RuleViolated {
                    rule: rule.name.clone(),
                    predicate: format!("forbidden but present: {predicate}"),
                });
            }
        }
        Effect::Limit { field, max } => {
            let value = ctx.fields.get(field).and_then(|v| v.as_u64()).unwrap_or(0);
            if value > *max {
                return Err(PolicyError::RuleViolated {
                    rule: rule.name.clone(),
                    predicate: format!("{field}={value} exceeds limit {max}"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::finding::Severity;

    fn ctx() -> RequestContext {
        RequestContext { tier: "free".into(), ..Default::default() }
    }

    #[test]
    fn require_fails_when_predicate_absent() {
        let rule = Rule::require("must-see-call-edges", Predicate::EdgeKind(EdgeKind::DirectCall));
        assert!(evaluate(&rule, &ctx()).is_err());
    }

    #[test]
    fn forbid_passes_when_predicate_absent() {
        let rule = Rule::forbid("no-critical", Predicate::FindingSeverityAtLeast(Severity::Critical));
        assert!(evaluate(&rule, &ctx()).is_ok());
    }

    #[test]
    fn limit_rejects_value_over_max() {
        let mut context = ctx();
        context.fields.insert("modules_scanned".into(), serde_json::json!(50));
        let rule = Rule::limit("cap-modules", "modules_scanned", 10);
        let err = evaluate(&rule, &context).unwrap_err();
        assert!(matches!(err, PolicyError::RuleViolated { .. }));
    }

    #[test]
    fn limit_accepts_value_at_max() {
        let mut context = ctx();
        context.fields.insert("modules_scanned".into(), serde_json::json!(10));
        let rule = Rule::limit("cap-modules", "modules_scanned", 10);
        assert!(evaluate(&rule, &context).is_ok());
    }
}
