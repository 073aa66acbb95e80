//! Step dispatch and case orchestration
//!
//! Routes translated step descriptors to the automation backend, records every
//! dispatch in the shared history store, runs test cases fail-fast and drives
//! the interactive step debugger.

pub mod backend;
pub mod context;
pub mod debugger;
pub mod errors;
pub mod executor;
pub mod runner;
pub mod script;
pub mod types;

pub use backend::{
    ActOptions, AgentTaskRequest, AgentTaskResult, AutomationSession, ObservedElement,
    SessionProvider, ShapeHint, ACT_RETRIES, ACT_TIMEOUT_MS, DEFAULT_AGENT_MAX_STEPS,
};
pub use context::{ExecutionContext, BASE_URL_VAR, DEFAULT_BASE_URL};
pub use debugger::{
    DebugCommand, DebugController, DebugMachine, DebugPrompt, DebugReport, DebugState,
    StepDebugger,
};
pub use errors::{BackendError, DebugError, FlowError, ScriptError, SessionError};
pub use executor::StepExecutor;
pub use runner::TestCaseRunner;
pub use script::{Script, ScriptCommand, ScriptReport};
pub use types::{CaseFailure, CaseResult, CaseState, RunnerStats};
