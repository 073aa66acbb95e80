use std::sync::Arc;

use step_translator::VariableTable;

use crate::backend::{SessionProvider, DEFAULT_AGENT_MAX_STEPS};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Variable that overrides the configured base URL.
pub const BASE_URL_VAR: &str = "TEST_BASE_URL";

/// Everything a step needs from its surroundings, passed explicitly.
#[derive(Clone)]
pub struct ExecutionContext {
    variables: Arc<VariableTable>,
    sessions: Arc<dyn SessionProvider>,
    base_url: String,
    agent_max_steps: u32,
}

impl ExecutionContext {
    pub fn new(variables: Arc<VariableTable>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            variables,
            sessions,
            base_url: DEFAULT_BASE_URL.to_string(),
            agent_max_steps: DEFAULT_AGENT_MAX_STEPS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_agent_max_steps(mut self, max_steps: u32) -> Self {
        self.agent_max_steps = max_steps;
        self
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn sessions(&self) -> &Arc<dyn SessionProvider> {
        &self.sessions
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn agent_max_steps(&self) -> u32 {
        self.agent_max_steps
    }
}
