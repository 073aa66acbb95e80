use itest_core_types::ActionKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A descriptor failed its kind-specific validation
    #[error("invalid {kind} descriptor: {reason}")]
    InvalidDescriptor { kind: ActionKind, reason: String },
}

impl TranslateError {
    pub fn invalid(kind: ActionKind, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            kind,
            reason: reason.into(),
        }
    }
}
