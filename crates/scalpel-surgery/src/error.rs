use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, thiserror::Error)]
pub enum SurgeryError {
    #[error("symbol {0} not found in {1}")]
    SymbolNotFound(String, String),
    #[error("new source failed to parse: {0}")]
    ParseFailed(String),
    #[error("patch would widen the symbol's interface without explicit permission")]
    InterfaceWidened,
    #[error("patch introduces unresolved external symbols not present before")]
    NewUnresolvedSymbols(Vec<String>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SurgeryError> for ScalpelError {
    fn from(err: SurgeryError) -> Self {
        let kind = match &err {
            SurgeryError::SymbolNotFound(..) => ErrorKind::NotFound,
            SurgeryError::ParseFailed(_)
            | SurgeryError::InterfaceWidened
            | SurgeryError::NewUnresolvedSymbols(_) => ErrorKind::InvalidArgument,
            SurgeryError::Io(_) => ErrorKind::InternalError,
        };
        ScalpelError::new(kind, err.to_string())
    }
}
