use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, thiserror::Error)]
pub enum PdgError {
    #[error("statement {0:?} is not part of this function's CFG")]
    UnknownStatement(scalpel_core::uir::NodeId),
    #[error("solver query failed: {0}")]
    SolverFailure(String),
}

impl From<PdgError> for ScalpelError {
    fn from(err: PdgError) -> Self {
        match &err {
            PdgError::UnknownStatement(_) => ScalpelError::new(ErrorKind::InvalidArgument, err.to_string()),
            PdgError::SolverFailure(_) => ScalpelError::new(ErrorKind::DependencyUnavailable, err.to_string()),
        }
    }
}
