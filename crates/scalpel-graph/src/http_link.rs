//! HTTP endpoint <-> fetch-call linking (spec.md §4.5 "HTTP link
//! detection"). No teacher module covers this directly; the pattern-scan
//! style (regex over raw source, not the UIR) is grounded on
//! `effect_analysis/infrastructure/patterns/javascript.rs`'s approach of
//! matching framework call shapes against source text rather than
//! walking a fully resolved AST.

use crate::builder::FileUnit;
use once_cell::sync::Lazy;
use regex::Regex;
use scalpel_core::graph::{EdgeKind, GraphEdge};
use scalpel_core::symbol::SymbolKind;
use scalpel_core::SymbolId;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub symbol: SymbolId,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub struct FetchCall {
    pub symbol: SymbolId,
    segments: Vec<Segment>,
    /// True if any segment came from string interpolation rather than a
    /// literal path parameter match — used to distinguish pattern match
    /// from the weaker dynamic-route match.
    interpolated: bool,
}

static ROUTE_DECORATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:app|router)\.(?:get|post|put|delete|patch)\(\s*"([^"]+)"\s*\)\s*\n\s*(?:async\s+)?def\s+(\w+)"#).unwrap()
});

static FETCH_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"fetch\(\s*"([^"]+)"\s*\)"#).unwrap());
static FETCH_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"fetch\(\s*`([^`]+)`\s*\)"#).unwrap());
static AXIOS_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"axios\.\w+\(\s*"([^"]+)"\s*\)"#).unwrap());
static AXIOS_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"axios\.\w+\(\s*`([^`]+)`\s*\)"#).unwrap());

fn split_literal(path: &str) -> Vec<Segment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('{') && s.ends_with('}') {
                Segment::Param
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect()
}

fn split_template(path: &str) -> (Vec<Segment>, bool) {
    let mut interpolated = false;
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.contains("${") {
                interpolated = true;
                Segment::Param
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect();
    (segments, interpolated)
}

pub fn find_endpoints(file: &FileUnit) -> Vec<Endpoint> {
    let text = String::from_utf8_lossy(&file.source);
    ROUTE_DECORATOR
        .captures_iter(&text)
        .map(|cap| {
            let path = &cap[1];
            let name = &cap[2];
            Endpoint {
                symbol: SymbolId::new(
                    file.language.as_str(),
                    &file.module_path,
                    SymbolKind::Function,
                    name,
                    None,
                ),
                segments: split_literal(path),
            }
        })
        .collect()
}

pub fn find_fetch_calls(file: &FileUnit) -> Vec<FetchCall> {
    let text = String::from_utf8_lossy(&file.source);
    let mut calls = Vec::new();
    let mut push_literal = |re: &Regex, text: &str, calls: &mut Vec<FetchCall>| {
        for (i, cap) in re.captures_iter(text).enumerate() {
            calls.push(FetchCall {
                symbol: SymbolId::new(
                    file.language.as_str(),
                    &file.module_path,
                    SymbolKind::Unresolved,
                    &format!("fetch_call_{}_{}", cap.get(0).unwrap().start(), i),
                    None,
                ),
                segments: split_literal(&cap[1]),
                interpolated: false,
            });
        }
    };
    push_literal(&FETCH_LITERAL, &text, &mut calls);
    push_literal(&AXIOS_LITERAL, &text, &mut calls);

    let mut push_template = |re: &Regex, text: &str, calls: &mut Vec<FetchCall>| {
        for cap in re.captures_iter(text) {
            let (segments, interpolated) = split_template(&cap[1]);
            calls.push(FetchCall {
                symbol: SymbolId::new(
                    file.language.as_str(),
                    &file.module_path,
                    SymbolKind::Unresolved,
                    &format!("fetch_call_{}", cap.get(0).unwrap().start()),
                    None,
                ),
                segments,
                interpolated,
            });
        }
    };
    push_template(&FETCH_TEMPLATE, &text, &mut calls);
    push_template(&AXIOS_TEMPLATE, &text, &mut calls);

    calls
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    Dynamic,
    Pattern,
    Exact,
}

fn common_literal_prefix_len(a: &[Segment], b: &[Segment]) -> usize {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| matches!((x, y), (Segment::Literal(lx), Segment::Literal(ly)) if lx == ly))
        .count()
}

fn classify(endpoint: &Endpoint, call: &FetchCall) -> Option<(MatchKind, usize)> {
    if endpoint.segments.len() == call.segments.len() {
        let all_match = endpoint
            .segments
            .iter()
            .zip(call.segments.iter())
            .all(|(e, c)| match (e, c) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                (Segment::Param, _) => true,
                (Segment::Literal(_), Segment::Param) => false,
            });
        if !all_match {
            return None;
        }
        let prefix = common_literal_prefix_len(&endpoint.segments, &call.segments);

        // A call built from string interpolation resolves its param
        // slots at runtime, not in source text — the weaker match.
        if call.interpolated {
            return Some((MatchKind::Dynamic, prefix));
        }

        // Identical segment sequences with a param slot on both sides
        // means the call site itself was written as a static pattern
        // (e.g. a literal "/users/{id}" text), not a resolved value —
        // spec.md §4.5's pattern-match bullet.
        if endpoint.segments == call.segments && endpoint.segments.iter().any(|s| matches!(s, Segment::Param)) {
            return Some((MatchKind::Pattern, prefix));
        }

        // Otherwise the call supplies a concrete literal for every
        // endpoint param slot (or the paths are fully literal and
        // equal): an exact match.
        return Some((MatchKind::Exact, prefix));
    }

    let prefix = common_literal_prefix_len(&endpoint.segments, &call.segments);
    if prefix > 0 {
        return Some((MatchKind::Dynamic, prefix));
    }
    None
}

/// Match endpoints against fetch calls per spec.md §4.5's tie-break:
/// exact beats pattern beats dynamic; within the same kind, prefer the
/// longest non-parameter prefix. Each call links to at most one
/// endpoint (its best match); an endpoint may serve many calls.
pub fn match_links(endpoints: &[Endpoint], calls: &[FetchCall], _threshold: f32) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    for call in calls {
        let best = endpoints
            .iter()
            .filter_map(|endpoint| classify(endpoint, call).map(|(kind, prefix)| (kind, prefix, endpoint)))
            .max_by(|(ka, pa, _), (kb, pb, _)| ka.cmp(kb).then(pa.cmp(pb)));

        let Some((kind, _, endpoint)) = best else {
            continue;
        };
        let (edge_kind, confidence, evidence) = match kind {
            MatchKind::Exact => (EdgeKind::HttpExactMatch, 0.95, "exact path literal match"),
            MatchKind::Pattern => (EdgeKind::HttpPatternMatch, 0.8, "path parameter pattern match"),
            MatchKind::Dynamic => (
                EdgeKind::HttpDynamicRoute,
                0.5,
                "interpolated path with shared literal prefix",
            ),
        };
        edges.push(GraphEdge::new_heuristic(
            call.symbol.clone(),
            endpoint.symbol.clone(),
            edge_kind,
            confidence,
            evidence,
            GraphEdge::DEFAULT_THRESHOLD,
        ));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_core::Language;
    use std::path::PathBuf;

    fn file(source: &str, language: Language) -> FileUnit {
        FileUnit {
            path: PathBuf::from("f"),
            language,
            module_path: "m".to_string(),
            source: source.as_bytes().to_vec(),
            tree: scalpel_core::uir::UirTree::new(),
        }
    }

    #[test]
    fn exact_literal_match_scores_highest() {
        let backend = file(
            "@app.get(\"/users\")\ndef list_users():\n    pass\n",
            Language::Python,
        );
        let frontend = file("fetch(\"/users\")", Language::TypeScript);

        let endpoints = find_endpoints(&backend);
        let calls = find_fetch_calls(&frontend);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(calls.len(), 1);

        let edges = match_links(&endpoints, &calls, GraphEdge::DEFAULT_THRESHOLD);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::HttpExactMatch);
    }

    #[test]
    fn literal_value_against_param_slot_scores_exact() {
        let backend = file(
            "@app.get(\"/api/users/{id}\")\ndef get_user():\n    pass\n",
            Language::Python,
        );
        let frontend = file("fetch(\"/api/users/42\")", Language::TypeScript);

        let endpoints = find_endpoints(&backend);
        let calls = find_fetch_calls(&frontend);
        let edges = match_links(&endpoints, &calls, GraphEdge::DEFAULT_THRESHOLD);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::HttpExactMatch);
    }

    #[test]
    fn interpolated_template_against_param_slot_scores_dynamic() {
        let backend = file(
            "@app.get(\"/api/users/{id}\")\ndef get_user():\n    pass\n",
            Language::Python,
        );
        let frontend = file("fetch(`/api/users/${userId}`)", Language::TypeScript);

        let endpoints = find_endpoints(&backend);
        let calls = find_fetch_calls(&frontend);
        let edges = match_links(&endpoints, &calls, GraphEdge::DEFAULT_THRESHOLD);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::HttpDynamicRoute);
    }

    #[test]
    fn static_pattern_text_against_param_slot_scores_pattern() {
        let backend = file(
            "@app.get(\"/users/{id}\")\ndef get_user():\n    pass\n",
            Language::Python,
        );
        // Written as a literal pattern, not interpolated: "{id}" stays
        // curly-brace text in the fetch call source itself.
        let frontend = file("fetch(\"/users/{id}\")", Language::TypeScript);

        let endpoints = find_endpoints(&backend);
        let calls = find_fetch_calls(&frontend);
        let edges = match_links(&endpoints, &calls, GraphEdge::DEFAULT_THRESHOLD);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::HttpPatternMatch);
    }

    #[test]
    fn unrelated_paths_produce_no_edge() {
        let backend = file(
            "@app.get(\"/orders\")\ndef list_orders():\n    pass\n",
            Language::Python,
        );
        let frontend = file("fetch(\"/users\")", Language::TypeScript);

        let endpoints = find_endpoints(&backend);
        let calls = find_fetch_calls(&frontend);
        let edges = match_links(&endpoints, &calls, GraphEdge::DEFAULT_THRESHOLD);
        assert!(edges.is_empty());
    }
}
