use scalpel_core::error::{ErrorKind, ScalpelError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, thiserror::Error)]
pub enum IngestError {
    #[error("path does not exist: {0}")]
    InvalidPath(PathBuf),
    #[error("path is not readable: {0}")]
    Forbidden(PathBuf),
    #[error("ingest was cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn invalid_path(path: &Path) -> Self {
        IngestError::InvalidPath(path.to_path_buf())
    }

    pub fn forbidden(path: &Path) -> Self {
        IngestError::Forbidden(path.to_path_buf())
    }
}

impl From<IngestError> for ScalpelError {
    fn from(err: IngestError) -> Self {
        match &err {
            IngestError::InvalidPath(_) => ScalpelError::new(ErrorKind::InvalidPath, err.to_string()),
            IngestError::Forbidden(_) => ScalpelError::new(ErrorKind::Forbidden, err.to_string()),
            // No dedicated kind for cancellation in the closed vocabulary;
            // a cancelled request is a timeout from the caller's view.
            IngestError::Cancelled => ScalpelError::new(ErrorKind::Timeout, err.to_string()),
        }
    }
}
