//! Tool Dispatcher (C9): a synchronous facade over `ToolRequest ->
//! ToolResponseEnvelope`, admitting requests through the policy engine
//! and enforcing cross-cutting timeouts. No MCP transport dependency —
//! that boundary is out of scope per spec.md §1.

pub mod dispatcher;
pub mod envelope;
pub mod registry;
pub mod tools;

pub use dispatcher::Dispatcher;
pub use envelope::{timeout_error, ResponseErrorBody, ToolRequest, ToolResponseEnvelope};
pub use registry::{ToolHandler, ToolRegistry};
pub use tools::build_registry;
