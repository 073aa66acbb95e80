//! Dispatch, session and script error types

use itest_core_types::WorkflowId;
use step_translator::TranslateError;
use thiserror::Error;

/// Failure reported by the automation backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("act failed: {0}")]
    Act(String),

    #[error("extraction failed: {0}")]
    Extract(String),

    #[error("observation failed: {0}")]
    Observe(String),

    #[error("agent task failed: {0}")]
    Agent(String),

    #[error("backend error: {0}")]
    Other(String),
}

/// The session provider could not hand out a session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no session for workflow '{workflow}': {reason}")]
pub struct SessionError {
    pub workflow: WorkflowId,
    pub reason: String,
}

impl SessionError {
    pub fn new(workflow: &WorkflowId, reason: impl Into<String>) -> Self {
        Self {
            workflow: workflow.clone(),
            reason: reason.into(),
        }
    }
}

/// Scripted-step parse and evaluation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: assertion failed: {message}")]
    Assertion { line: usize, message: String },

    #[error("line {line}: {source}")]
    Backend {
        line: usize,
        #[source]
        source: BackendError,
    },
}

/// Interactive debugger command rejected in the current state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DebugError {
    #[error("command '{command}' is not valid while {state}")]
    InvalidCommand { command: String, state: String },

    #[error("step {step} reached the retry limit of {limit}")]
    RetryLimit { step: usize, limit: u32 },
}

/// Errors raised while dispatching a step
#[derive(Debug, Error)]
pub enum FlowError {
    /// Descriptor failed validation before any backend call
    #[error(transparent)]
    InvalidDescriptor(#[from] TranslateError),

    /// Automation backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Scripted step failure
    #[error("script failed at {0}")]
    Script(#[from] ScriptError),

    /// Generic act exceeded its time budget
    #[error("act timed out after {0}ms")]
    Timeout(u64),

    /// Session provider failure; propagated to the caller unchanged
    #[error(transparent)]
    SessionUnavailable(#[from] SessionError),

    /// Debugger refused a transition it issued itself
    #[error(transparent)]
    Debugger(#[from] DebugError),
}

impl FlowError {
    /// Failures that stop the step but are reported as data.
    pub fn is_step_failure(&self) -> bool {
        !matches!(self, FlowError::SessionUnavailable(_) | FlowError::Debugger(_))
    }
}
