use scalpel_core::error::{ErrorKind, ScalpelError};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy manifest signature or file hash mismatch; engine is failing closed")]
    ManifestInvalid,
    #[error("rule `{rule}` violated: {predicate}")]
    RuleViolated { rule: String, predicate: String },
    #[error("change budget exhausted: {resource}")]
    BudgetExhausted { resource: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PolicyError> for ScalpelError {
    fn from(err: PolicyError) -> Self {
        let kind = match &err {
            PolicyError::ManifestInvalid | PolicyError::RuleViolated { .. } => ErrorKind::Forbidden,
            PolicyError::BudgetExhausted { .. } => ErrorKind::ResourceExhausted,
            PolicyError::Io(_) => ErrorKind::InternalError,
        };
        ScalpelError::new(kind, err.to_string())
    }
}
