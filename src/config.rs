//! Runner configuration (`itest.yaml`)

use std::path::PathBuf;

use action_flow::{DEFAULT_AGENT_MAX_STEPS, DEFAULT_BASE_URL};
pub use action_flow::BASE_URL_VAR;
use serde::{Deserialize, Serialize};
use step_translator::VariableTable;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItestConfig {
    /// Custom step pattern definitions.
    pub patterns_path: PathBuf,
    /// Where extracted artifacts and export bundles are written.
    pub results_dir: PathBuf,
    pub persist_extracted: bool,
    pub base_url: String,
    /// `KEY=VALUE` file feeding `%NAME%` placeholders.
    pub credentials_env: PathBuf,
    pub cache_dir: PathBuf,
    pub max_debug_retries: u32,
    pub agent_max_steps: u32,
}

impl Default for ItestConfig {
    fn default() -> Self {
        Self {
            patterns_path: PathBuf::from("config/step-patterns.yaml"),
            results_dir: PathBuf::from("results"),
            persist_extracted: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials_env: PathBuf::from("test-data/credentials.env"),
            cache_dir: PathBuf::from("cache"),
            max_debug_retries: 3,
            agent_max_steps: DEFAULT_AGENT_MAX_STEPS,
        }
    }
}

impl ItestConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// `TEST_BASE_URL` in the variable table wins over the configured value.
    pub fn effective_base_url(&self, vars: &VariableTable) -> String {
        vars.get(BASE_URL_VAR)
            .map(str::to_string)
            .unwrap_or_else(|| self.base_url.clone())
    }
}
