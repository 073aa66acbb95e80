use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the itest crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown action kind: {0}")]
    UnknownActionKind(String),

    #[error("unknown translation engine: {0}")]
    UnknownEngine(String),
}

/// Logical grouping key selecting which automation session a step runs against.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self("shared-actions".to_string())
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of operations a step can translate into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Goto,
    Extract,
    Observe,
    Agent,
    Act,
    Template,
}

impl ActionKind {
    /// Bucket order used when scanning the rule table.
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Goto,
        ActionKind::Extract,
        ActionKind::Observe,
        ActionKind::Agent,
        ActionKind::Act,
        ActionKind::Template,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Goto => "goto",
            ActionKind::Extract => "extract",
            ActionKind::Observe => "observe",
            ActionKind::Agent => "agent",
            ActionKind::Act => "act",
            ActionKind::Template => "template",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goto" => Ok(ActionKind::Goto),
            "extract" => Ok(ActionKind::Extract),
            "observe" => Ok(ActionKind::Observe),
            "agent" => Ok(ActionKind::Agent),
            "act" => Ok(ActionKind::Act),
            "template" => Ok(ActionKind::Template),
            other => Err(CoreError::UnknownActionKind(other.to_string())),
        }
    }
}

/// Which engine produced a descriptor and therefore how it is dispatched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationEngine {
    /// Rule with a code template; dispatched through the scripted-step interpreter.
    Rules,
    /// Raw instruction forwarded to a backend agent task.
    Agent,
    /// Typed handler or generic backend act.
    #[default]
    Direct,
}

impl TranslationEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            TranslationEngine::Rules => "rules",
            TranslationEngine::Agent => "agent",
            TranslationEngine::Direct => "direct",
        }
    }
}

impl fmt::Display for TranslationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationEngine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" => Ok(TranslationEngine::Rules),
            "agent" => Ok(TranslationEngine::Agent),
            "direct" => Ok(TranslationEngine::Direct),
            other => Err(CoreError::UnknownEngine(other.to_string())),
        }
    }
}
