use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("no parser registered for language: {0}")]
    UnsupportedLanguage(String),
    #[error("tree-sitter failed to produce a tree for {0}")]
    ParserFailure(String),
}

impl From<ParseError> for ScalpelError {
    fn from(err: ParseError) -> Self {
        match &err {
            ParseError::UnsupportedLanguage(_) => {
                ScalpelError::new(ErrorKind::NotImplemented, err.to_string())
            }
            ParseError::ParserFailure(_) => {
                ScalpelError::new(ErrorKind::InternalError, err.to_string())
            }
        }
    }
}
