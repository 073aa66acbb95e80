use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_flow::{ExecutionContext, StepExecutor};
use history_store::{FsArtifactSink, HistoryStore};
use step_patterns::PatternRegistry;
use step_translator::{Translator, VariableTable};
use tokio::sync::OnceCell;

use super::output::OutputFormat;
use super::runtime::{build_registry, build_variables};
use crate::config::ItestConfig;
use crate::dry_run::DryRunProvider;

pub struct CliContext {
    config: Arc<ItestConfig>,
    config_path: PathBuf,
    output: OutputFormat,
    registry: OnceCell<Arc<PatternRegistry>>,
    variables: OnceCell<Arc<VariableTable>>,
}

/// Store, executor and execution context shared by one command invocation.
pub struct Workbench {
    pub store: Arc<HistoryStore>,
    pub executor: Arc<StepExecutor>,
    pub exec: ExecutionContext,
}

impl CliContext {
    pub fn new(config: ItestConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            registry: OnceCell::new(),
            variables: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ItestConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub async fn registry(&self) -> Arc<PatternRegistry> {
        self.registry
            .get_or_init(|| async { Arc::new(build_registry(&self.config.patterns_path)) })
            .await
            .clone()
    }

    pub async fn variables(&self) -> Arc<VariableTable> {
        self.variables
            .get_or_init(|| async { Arc::new(build_variables(&self.config)) })
            .await
            .clone()
    }

    pub async fn translator(&self) -> Translator {
        Translator::new(self.registry().await)
    }

    pub async fn workbench(&self) -> Workbench {
        let store = if self.config.persist_extracted {
            let sink = Arc::new(FsArtifactSink::new(self.config.results_dir.clone()));
            Arc::new(HistoryStore::with_sink(sink))
        } else {
            Arc::new(HistoryStore::new())
        };
        let executor = Arc::new(StepExecutor::new(self.translator().await, store.clone()));
        let variables = self.variables().await;
        let base_url = self.config.effective_base_url(&variables);
        let exec = ExecutionContext::new(variables, Arc::new(DryRunProvider::new()))
            .with_base_url(base_url)
            .with_agent_max_steps(self.config.agent_max_steps);
        Workbench {
            store,
            executor,
            exec,
        }
    }
}
