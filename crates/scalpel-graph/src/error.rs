use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown seed symbol: {0}")]
    UnknownSymbol(String),
}

impl From<GraphError> for ScalpelError {
    fn from(err: GraphError) -> Self {
        match &err {
            GraphError::UnknownSymbol(_) => ScalpelError::new(ErrorKind::NotFound, err.to_string()),
        }
    }
}
