//! Closed error vocabulary (spec.md §7).
//!
//! Every component-specific error type in the workspace eventually maps
//! into one of these kinds. The mapping lives at the crate boundary
//! closest to the component that can actually attribute the failure to a
//! user-facing condition, per the propagation policy in spec.md §7 —
//! `scalpel-dispatch` never invents a new kind, it only forwards or wraps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of error kinds. 1:1 with the envelope error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidPath,
    Forbidden,
    NotFound,
    Timeout,
    TooLarge,
    ResourceExhausted,
    NotImplemented,
    UpgradeRequired,
    DependencyUnavailable,
    InternalError,
}

impl ErrorKind {
    /// The envelope error code string for this kind (spec.md §6).
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::NotImplemented => "not_implemented",
            ErrorKind::UpgradeRequired => "upgrade_required",
            ErrorKind::DependencyUnavailable => "dependency_unavailable",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error already attributed to a closed [`ErrorKind`], carrying a
/// human-readable message and optional structured details.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ScalpelError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ScalpelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPath, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}
