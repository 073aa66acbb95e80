//! Pattern registry error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or compiling rule definitions.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A matcher source did not compile as a regular expression
    #[error("pattern '{name}' has an invalid matcher: {reason}")]
    InvalidMatcher { name: String, reason: String },

    /// A rule definition is structurally unusable
    #[error("pattern '{name}' is invalid: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// The config names a bucket outside the closed action set
    #[error("unknown action type '{0}' in pattern config")]
    UnknownKind(String),

    /// The config file could not be read
    #[error("failed to read pattern config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected shape
    #[error("failed to parse pattern config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl PatternError {
    pub fn invalid_matcher(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidMatcher {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
