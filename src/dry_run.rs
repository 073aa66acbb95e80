//! Logging, in-memory automation backend.
//!
//! Lets scenarios run end to end without a browser: navigation is tracked per
//! session, every other call is logged and answered with an empty result of the
//! requested shape.

use std::sync::Arc;

use action_flow::{
    ActOptions, AgentTaskRequest, AgentTaskResult, AutomationSession, BackendError,
    ObservedElement, SessionError, SessionProvider, ShapeHint,
};
use async_trait::async_trait;
use dashmap::DashMap;
use itest_core_types::WorkflowId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

const BLANK_PAGE: &str = "about:blank";

/// One session per workflow, created on first use and reused afterwards.
#[derive(Default)]
pub struct DryRunProvider {
    sessions: DashMap<WorkflowId, Arc<DryRunSession>>,
}

impl DryRunProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn ensure_session(&self, workflow: &WorkflowId) -> Arc<DryRunSession> {
        if let Some(session) = self.sessions.get(workflow) {
            return session.value().clone();
        }
        let session = self
            .sessions
            .entry(workflow.clone())
            .or_insert_with(|| Arc::new(DryRunSession::new(workflow.clone())))
            .value()
            .clone();
        info!(workflow = %workflow, session = %session.id, "dry-run session opened");
        session
    }
}

#[async_trait]
impl SessionProvider for DryRunProvider {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError> {
        let session: Arc<dyn AutomationSession> = self.ensure_session(workflow);
        Ok(session)
    }
}

pub struct DryRunSession {
    id: String,
    workflow: WorkflowId,
    history: Mutex<Vec<Url>>,
}

impl DryRunSession {
    pub fn new(workflow: WorkflowId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn current_url(&self) -> Option<Url> {
        self.history.lock().last().cloned()
    }
}

#[async_trait]
impl AutomationSession for DryRunSession {
    async fn navigate(&self, url: &str) -> Result<(), BackendError> {
        let parsed = Url::parse(url)
            .map_err(|err| BackendError::Navigation(format!("{url}: {err}")))?;
        info!(workflow = %self.workflow, url = %parsed, "dry-run navigate");
        self.history.lock().push(parsed);
        Ok(())
    }

    async fn go_back(&self) -> Result<(), BackendError> {
        let mut history = self.history.lock();
        if history.len() > 1 {
            history.pop();
        }
        info!(workflow = %self.workflow, depth = history.len(), "dry-run back");
        Ok(())
    }

    async fn reload(&self) -> Result<(), BackendError> {
        info!(workflow = %self.workflow, "dry-run reload");
        Ok(())
    }

    async fn title(&self) -> Result<String, BackendError> {
        Ok(self
            .current_url()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| BLANK_PAGE.to_string()))
    }

    async fn act(&self, instruction: &str, options: &ActOptions) -> Result<Value, BackendError> {
        info!(
            workflow = %self.workflow,
            instruction,
            variables = options.variables.len(),
            "dry-run act"
        );
        Ok(json!({ "dryRun": true, "instruction": instruction }))
    }

    async fn extract(&self, target: &str, shape: ShapeHint) -> Result<Value, BackendError> {
        info!(workflow = %self.workflow, extracted = target, shape = %shape, "dry-run extract");
        Ok(match shape {
            ShapeHint::List | ShapeHint::Links => json!([]),
            ShapeHint::Text => json!(""),
            ShapeHint::Auto => Value::Null,
        })
    }

    async fn observe(&self, target: &str) -> Result<Vec<ObservedElement>, BackendError> {
        debug!(workflow = %self.workflow, observed = target, "dry-run observe");
        Ok(Vec::new())
    }

    async fn run_agent_task(
        &self,
        request: &AgentTaskRequest,
    ) -> Result<AgentTaskResult, BackendError> {
        info!(
            workflow = %self.workflow,
            instruction = %request.instruction,
            max_steps = request.max_steps,
            "dry-run agent task"
        );
        Ok(AgentTaskResult {
            completed: true,
            ..AgentTaskResult::default()
        })
    }
}
