//! Intra-file scope chain used for eager symbol resolution (spec.md
//! §4.3: "Resolves intra-file scopes eagerly... records identifier
//! resolution failures as `Unresolved` attributes rather than errors.")

use scalpel_core::SymbolId;
use std::collections::HashMap;

pub struct ScopeChain {
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn define(&mut self, name: &str, id: SymbolId) {
        self.scopes
            .last_mut()
            .expect("scope chain always has a root scope")
            .insert(name.to_string(), id);
    }

    /// Search from the innermost scope outward, matching spec.md's
    /// "current module scope chain" resolution order.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(id) = scope.get(name) {
                return Some(id.clone());
            }
        }
        None
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}
