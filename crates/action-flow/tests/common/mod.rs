#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use action_flow::{
    ActOptions, AgentTaskRequest, AgentTaskResult, AutomationSession, BackendError,
    ExecutionContext, ObservedElement, SessionError, SessionProvider, ShapeHint, StepExecutor,
};
use async_trait::async_trait;
use history_store::HistoryStore;
use itest_core_types::WorkflowId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use step_patterns::{PatternConfig, PatternRegistry};
use step_translator::{Translator, VariableTable};

/// In-memory session that records every call.
#[derive(Default)]
pub struct FakeSession {
    pub calls: Mutex<Vec<String>>,
    pub failing_acts: Mutex<HashSet<String>>,
    pub elements: Mutex<BTreeMap<String, Vec<ObservedElement>>>,
    pub agent_result: Mutex<Option<AgentTaskResult>>,
    pub last_act_options: Mutex<Option<ActOptions>>,
    pub last_agent_request: Mutex<Option<AgentTaskRequest>>,
    pub hang_acts: bool,
    pub title: String,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            title: "Fake Page".to_string(),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang_acts: true,
            ..Self::new()
        }
    }

    pub fn fail_act(&self, instruction: &str) {
        self.failing_acts.lock().insert(instruction.to_string());
    }

    pub fn with_elements(&self, target: &str, count: usize) {
        let elements = (0..count)
            .map(|i| ObservedElement {
                description: format!("{target} #{i}"),
                selector: format!("#el-{i}"),
                element_type: "button".to_string(),
                attributes: BTreeMap::new(),
            })
            .collect();
        self.elements.lock().insert(target.to_string(), elements);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AutomationSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), BackendError> {
        self.calls.lock().push(format!("navigate {url}"));
        if url.starts_with("http") {
            Ok(())
        } else {
            Err(BackendError::Navigation(format!("invalid url: {url}")))
        }
    }

    async fn go_back(&self) -> Result<(), BackendError> {
        self.calls.lock().push("back".to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<(), BackendError> {
        self.calls.lock().push("reload".to_string());
        Ok(())
    }

    async fn title(&self) -> Result<String, BackendError> {
        Ok(self.title.clone())
    }

    async fn act(&self, instruction: &str, options: &ActOptions) -> Result<Value, BackendError> {
        self.calls.lock().push(format!("act {instruction}"));
        *self.last_act_options.lock() = Some(options.clone());
        if self.hang_acts {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing_acts.lock().contains(instruction) {
            return Err(BackendError::Act(format!("could not {instruction}")));
        }
        Ok(json!({ "done": instruction }))
    }

    async fn extract(&self, target: &str, shape: ShapeHint) -> Result<Value, BackendError> {
        self.calls.lock().push(format!("extract {target} ({shape})"));
        Ok(match shape {
            ShapeHint::List => json!(["a", "b", "c"]),
            _ => json!(format!("text of {target}")),
        })
    }

    async fn observe(&self, target: &str) -> Result<Vec<ObservedElement>, BackendError> {
        self.calls.lock().push(format!("observe {target}"));
        Ok(self.elements.lock().get(target).cloned().unwrap_or_default())
    }

    async fn run_agent_task(
        &self,
        request: &AgentTaskRequest,
    ) -> Result<AgentTaskResult, BackendError> {
        self.calls.lock().push(format!("agent {}", request.instruction));
        *self.last_agent_request.lock() = Some(request.clone());
        Ok(self.agent_result.lock().clone().unwrap_or(AgentTaskResult {
            steps: vec![json!("step")],
            result: json!("ok"),
            error: None,
            completed: true,
        }))
    }
}

/// Hands out one shared session, or refuses when `available` is false.
pub struct FakeProvider {
    pub session: Arc<FakeSession>,
    pub available: bool,
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError> {
        if self.available {
            let session: Arc<dyn AutomationSession> = self.session.clone();
            Ok(session)
        } else {
            Err(SessionError::new(workflow, "browser crashed"))
        }
    }
}

pub struct Harness {
    pub session: Arc<FakeSession>,
    pub store: Arc<HistoryStore>,
    pub executor: Arc<StepExecutor>,
    pub ctx: ExecutionContext,
}

pub fn harness_with(session: FakeSession, vars: VariableTable, available: bool) -> Harness {
    build(session, PatternRegistry::builtin_only(), vars, available)
}

/// Builtins extended with the rules in `yaml`.
pub fn harness_with_patterns(yaml: &str, vars: VariableTable) -> Harness {
    let custom = PatternConfig::from_yaml_str(yaml).unwrap();
    let registry = PatternRegistry::with_custom(Some(&custom)).unwrap();
    build(FakeSession::new(), registry, vars, true)
}

fn build(session: FakeSession, registry: PatternRegistry, vars: VariableTable, available: bool) -> Harness {
    let session = Arc::new(session);
    let store = Arc::new(HistoryStore::new());
    let translator = Translator::new(Arc::new(registry));
    let executor = Arc::new(StepExecutor::new(translator, store.clone()));
    let provider = Arc::new(FakeProvider {
        session: session.clone(),
        available,
    });
    let ctx = ExecutionContext::new(Arc::new(vars), provider).with_base_url("http://base.test");
    Harness {
        session,
        store,
        executor,
        ctx,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeSession::new(), VariableTable::new(), true)
}
