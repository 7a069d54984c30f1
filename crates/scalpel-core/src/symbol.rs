//! Universal Node ID / SymbolId (spec.md §3, §6).
//!
//! Grammar (fixed): `<language>::<module_dotted_path>::<kind>::<name>[:<method>]`
//!
//! Deterministic and stable across runs for identical file content — the
//! same symbol parsed twice from the same bytes always yields the same
//! string. Parsers must refuse ids that do not match this grammar exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A symbol kind as it appears in the third grammar segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Module,
    Function,
    Class,
    Method,
    Variable,
    Parameter,
    Unresolved,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Module => "module",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Unresolved => "unresolved",
        };
        f.write_str(s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "module" => SymbolKind::Module,
            "function" => SymbolKind::Function,
            "class" => SymbolKind::Class,
            "method" => SymbolKind::Method,
            "variable" => SymbolKind::Variable,
            "parameter" => SymbolKind::Parameter,
            "unresolved" => SymbolKind::Unresolved,
            other => return Err(format!("unknown symbol kind: {other}")),
        })
    }
}

/// Deterministic, stable cross-language symbol identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct SymbolId(String);

impl SymbolId {
    /// Build a SymbolId from its components, producing the canonical
    /// grammar string. Does not validate `module_path`/`name` contents
    /// beyond rejecting the `::` separator, since identifiers in source
    /// languages cannot contain it.
    pub fn new(
        language: &str,
        module_path: &str,
        kind: SymbolKind,
        name: &str,
        method: Option<&str>,
    ) -> Self {
        let mut s = format!("{language}::{module_path}::{kind}::{name}");
        if let Some(m) = method {
            s.push(':');
            s.push_str(m);
        }
        Self(s)
    }

    /// Parse and validate a raw string against the fixed grammar.
    /// Refuses strings that do not match exactly, per spec.md §6.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.splitn(4, "::").collect();
        if parts.len() != 4 {
            return Err(format!(
                "invalid symbol id `{raw}`: expected 4 `::`-separated segments"
            ));
        }
        let (language, module_path, kind_and_name) = (parts[0], parts[1], parts[2..].join("::"));
        if language.is_empty() || module_path.is_empty() {
            return Err(format!("invalid symbol id `{raw}`: empty language or module"));
        }
        let kind_segment = parts[2];
        kind_segment
            .parse::<SymbolKind>()
            .map_err(|e| format!("invalid symbol id `{raw}`: {e}"))?;
        if parts[3].is_empty() {
            return Err(format!("invalid symbol id `{raw}`: empty name segment"));
        }
        let _ = kind_and_name;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `language` segment.
    pub fn language(&self) -> &str {
        self.0.split("::").next().unwrap_or("")
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SymbolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_via_new_and_parse() {
        let id = SymbolId::new("python", "app.api", SymbolKind::Function, "get_user", None);
        assert_eq!(id.as_str(), "python::app.api::function::get_user");
        let parsed = SymbolId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn carries_method_suffix() {
        let id = SymbolId::new(
            "java",
            "com.acme.Service",
            SymbolKind::Method,
            "UserService",
            Some("findById"),
        );
        assert_eq!(
            id.as_str(),
            "java::com.acme.Service::method::UserService:findById"
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(SymbolId::parse("not-a-symbol-id").is_err());
        assert!(SymbolId::parse("python::mod::bogus_kind::name").is_err());
        assert!(SymbolId::parse("::mod::function::name").is_err());
    }

    #[test]
    fn is_deterministic_for_identical_inputs() {
        let a = SymbolId::new("python", "a.b", SymbolKind::Class, "Widget", None);
        let b = SymbolId::new("python", "a.b", SymbolKind::Class, "Widget", None);
        assert_eq!(a, b);
    }
}
