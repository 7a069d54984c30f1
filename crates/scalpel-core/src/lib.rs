//! Shared data model for the Code Scalpel core engine.
//!
//! Every other crate in the workspace depends on this one and nothing
//! else upstream of it: the UIR node/edge shape, the universal symbol id
//! grammar, the closed error-kind vocabulary, cancellation, and engine
//! configuration all live here so that C1-C9 can pass handles around by
//! value instead of by shared ownership.

pub mod audit;
pub mod cancel;
pub mod config;
pub mod error;
pub mod file;
pub mod finding;
pub mod graph;
pub mod symbol;
pub mod uir;

pub use audit::{AuditRecord, AuditSink, InMemoryAuditSink};
pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use error::{ErrorKind, ScalpelError};
pub use file::{File, Language};
pub use finding::{Finding, Severity};
pub use graph::{EdgeKind, GraphEdge};
pub use symbol::SymbolId;
pub use uir::{NodeId, UirNode, UirNodeKind, UirTree};

/// Result alias used across the workspace's crate boundaries for errors
/// that are already attributed to one of the closed [`ErrorKind`]s.
pub type Result<T> = std::result::Result<T, ScalpelError>;
