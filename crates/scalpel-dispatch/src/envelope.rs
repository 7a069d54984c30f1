//! Tool request/response envelope (spec.md §6 "External Interfaces").

use scalpel_core::error::{ErrorKind, ScalpelError};
use serde::{Deserialize, Serialize};

/// Inbound tool request, as handed to the dispatcher by the (external,
/// out-of-scope) MCP transport layer. Deserializing the wire JSON into
/// this shape is the transport's job, not this crate's; `dispatch()`
/// only ever sees an already-constructed `ToolRequest`.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub tool_id: String,
    pub arguments: serde_json::Value,
    pub request_id: String,
    pub tier_context: String,
    pub cancellation_token: scalpel_core::cancel::CancellationToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<&ScalpelError> for ResponseErrorBody {
    fn from(err: &ScalpelError) -> Self {
        Self {
            code: err.kind.code().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

/// Outbound response envelope. Every dispatch call produces exactly one
/// of these, success or failure (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponseEnvelope {
    pub tier: String,
    pub tool_version: String,
    pub tool_id: String,
    pub request_id: String,
    pub capabilities: Vec<String>,
    pub duration_ms: u64,
    pub error: Option<ResponseErrorBody>,
    pub warnings: Vec<String>,
    pub upgrade_hints: Vec<String>,
    pub data: serde_json::Value,
}

impl ToolResponseEnvelope {
    pub fn success(
        tier: impl Into<String>,
        tool_version: impl Into<String>,
        tool_id: impl Into<String>,
        request_id: impl Into<String>,
        duration_ms: u64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            tier: tier.into(),
            tool_version: tool_version.into(),
            tool_id: tool_id.into(),
            request_id: request_id.into(),
            capabilities: vec!["envelope-v1".to_string()],
            duration_ms,
            error: None,
            warnings: Vec::new(),
            upgrade_hints: Vec::new(),
            data,
        }
    }

    pub fn failure(
        tier: impl Into<String>,
        tool_version: impl Into<String>,
        tool_id: impl Into<String>,
        request_id: impl Into<String>,
        duration_ms: u64,
        error: ResponseErrorBody,
    ) -> Self {
        Self {
            tier: tier.into(),
            tool_version: tool_version.into(),
            tool_id: tool_id.into(),
            request_id: request_id.into(),
            capabilities: vec!["envelope-v1".to_string()],
            duration_ms,
            error: Some(error),
            warnings: Vec::new(),
            upgrade_hints: Vec::new(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Direct constructor for the `timeout` error code (spec.md §5: "On
/// timeout the dispatcher cancels the request token").
pub fn timeout_error() -> ScalpelError {
    ScalpelError::new(ErrorKind::Timeout, "tool call exceeded its wall-clock budget")
}
