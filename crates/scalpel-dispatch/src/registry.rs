//! Tool registry: maps a `tool_id` to the component entry point that
//! serves it. The dispatcher is "responsible only for ... resolving the
//! target component" (spec.md §4.9) — resolution itself is just a
//! lookup here.

use crate::envelope::ToolRequest;
use scalpel_core::cancel::CancellationToken;
use scalpel_core::error::ScalpelError;
use std::collections::HashMap;
use std::sync::Arc;

/// `Arc` rather than `Box` so the dispatcher can hand a cheap clone to a
/// background thread for the timeout-enforcement path without borrowing
/// from the registry itself.
pub type ToolHandler =
    Arc<dyn Fn(&ToolRequest, &CancellationToken) -> Result<serde_json::Value, ScalpelError> + Send + Sync>;

#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool_id: impl Into<String>, handler: ToolHandler) {
        self.handlers.insert(tool_id.into(), handler);
    }

    pub fn resolve(&self, tool_id: &str) -> Option<ToolHandler> {
        self.handlers.get(tool_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_tool_resolves() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", Arc::new(|req: &ToolRequest, _token: &CancellationToken| Ok(req.arguments.clone())));
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("missing").is_none());
    }
}
