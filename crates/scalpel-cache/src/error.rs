use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(String),
    #[error("failed to serialize cache entry: {0}")]
    Serialization(String),
    #[error("failed to deserialize cache entry: {0}")]
    Deserialization(String),
}

impl From<CacheError> for ScalpelError {
    fn from(err: CacheError) -> Self {
        ScalpelError::new(ErrorKind::InternalError, err.to_string())
    }
}
