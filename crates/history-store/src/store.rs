use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::StoreError;
use crate::model::{
    ExecutionRecord, ExportBundle, ExtractedArtifact, ExtractedSummary, HistoryStats, RecentStep,
    STORE_SCHEMA_VERSION,
};
use crate::sink::ArtifactSink;

#[derive(Default)]
struct StoreState {
    records: Vec<ExecutionRecord>,
    artifacts: BTreeMap<String, ExtractedArtifact>,
}

/// Process-wide append-only history plus the extracted-data map.
#[derive(Default)]
pub struct HistoryStore {
    state: RwLock<StoreState>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl HistoryStore {
    /// In-memory only; nothing is persisted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            sink: Some(sink),
        }
    }

    pub fn persists(&self) -> bool {
        self.sink.is_some()
    }

    pub fn append(&self, record: ExecutionRecord) {
        debug!(
            id = %record.id,
            kind = %record.kind(),
            success = record.is_success(),
            duration_ms = record.duration_ms,
            "execution recorded"
        );
        self.state.write().records.push(record);
    }

    /// Stores `data` under `key`, replacing any previous value.
    ///
    /// Sink failures are logged; the in-memory copy is kept regardless.
    pub fn put_artifact(&self, key: impl Into<String>, data: Value) -> ExtractedArtifact {
        let artifact = ExtractedArtifact::new(key, data);
        self.state
            .write()
            .artifacts
            .insert(artifact.key.clone(), artifact.clone());
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.persist_artifact(&artifact) {
                warn!(key = %artifact.key, error = %err, "failed to persist extracted data");
            }
        }
        artifact
    }

    pub fn artifact(&self, key: &str) -> Option<Value> {
        self.state.read().artifacts.get(key).map(|a| a.data.clone())
    }

    pub fn artifacts(&self) -> BTreeMap<String, Value> {
        self.state
            .read()
            .artifacts
            .iter()
            .map(|(key, artifact)| (key.clone(), artifact.data.clone()))
            .collect()
    }

    /// Last `limit` records, oldest first.
    pub fn history(&self, limit: usize) -> Vec<ExecutionRecord> {
        let state = self.state.read();
        let start = state.records.len().saturating_sub(limit);
        state.records[start..].to_vec()
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.state.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recent(&self, limit: usize) -> Vec<RecentStep> {
        self.history(limit).iter().map(RecentStep::from).collect()
    }

    pub fn stats(&self) -> HistoryStats {
        let state = self.state.read();
        let mut stats = HistoryStats {
            total_executions: state.records.len(),
            extracted_data: ExtractedSummary {
                total: state.artifacts.len(),
                keys: state.artifacts.keys().cloned().collect(),
            },
            ..HistoryStats::default()
        };

        let mut success_duration = 0u64;
        for record in &state.records {
            *stats.execution_types.entry(record.kind()).or_insert(0) += 1;
            if record.is_success() {
                stats.successful_executions += 1;
                success_duration += record.duration_ms;
            }
        }
        stats.failed_executions = stats.total_executions - stats.successful_executions;

        if stats.successful_executions > 0 {
            stats.average_duration =
                (success_duration as f64 / stats.successful_executions as f64).round() as u64;
        }
        if stats.total_executions > 0 {
            stats.success_rate = (stats.successful_executions as f64 * 100.0
                / stats.total_executions as f64)
                .round() as u32;
        }
        stats
    }

    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle {
            extracted_data: self.artifacts(),
            execution_history: self.records(),
            stats: self.stats(),
            export_timestamp: Utc::now(),
            version: STORE_SCHEMA_VERSION.to_string(),
        }
    }

    /// Writes the export bundle through the configured sink.
    pub fn export(&self) -> Result<PathBuf, StoreError> {
        let sink = self.sink.as_ref().ok_or(StoreError::NoSink)?;
        sink.persist_export(&self.export_bundle())
    }

    /// Drops every record and artifact.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.records.clear();
        state.artifacts.clear();
        info!("execution history and extracted data cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExecutionOutcome;
    use itest_core_types::{ActionKind, TranslationEngine, WorkflowId};
    use serde_json::json;
    use step_translator::ActionDescriptor;

    fn record(kind: ActionKind, ok: bool, duration_ms: u64) -> ExecutionRecord {
        let descriptor = ActionDescriptor {
            kind,
            original_text: format!("{kind} step"),
            resolved_text: format!("{kind} step"),
            params: Default::default(),
            captured_variables: Default::default(),
            matched_pattern_name: None,
            matched_pattern_description: None,
            matched_pattern: None,
            is_builtin: true,
            engine: TranslationEngine::Direct,
            generated_code: None,
        };
        let outcome = if ok {
            ExecutionOutcome::Success { result: json!({}) }
        } else {
            ExecutionOutcome::Failure {
                error: "boom".into(),
            }
        };
        ExecutionRecord::new(descriptor, outcome, duration_ms, WorkflowId::default())
    }

    #[test]
    fn stats_average_only_successful_runs() {
        let store = HistoryStore::new();
        store.append(record(ActionKind::Goto, true, 100));
        store.append(record(ActionKind::Act, true, 201));
        store.append(record(ActionKind::Act, false, 5000));

        let stats = store.stats();
        assert_eq!(stats.total_executions, 3);
        assert_eq!(stats.successful_executions, 2);
        assert_eq!(stats.failed_executions, 1);
        assert_eq!(stats.average_duration, 151);
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.execution_types[&ActionKind::Act], 2);
    }

    #[test]
    fn empty_store_stats_are_zero() {
        let stats = HistoryStore::new().stats();
        assert_eq!(stats.success_rate, 0);
        assert_eq!(stats.average_duration, 0);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let store = HistoryStore::new();
        store.append(record(ActionKind::Goto, true, 1));
        store.append(record(ActionKind::Extract, true, 2));
        store.append(record(ActionKind::Act, false, 3));
        let recent = store.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, ActionKind::Extract);
        assert!(!recent[1].success);
        assert_eq!(store.recent(10).len(), 3);
    }

    #[test]
    fn clear_resets_log_and_artifacts() {
        let store = HistoryStore::new();
        store.append(record(ActionKind::Act, true, 1));
        store.put_artifact("k", json!([1, 2]));
        store.clear();
        assert!(store.is_empty());
        assert!(store.artifacts().is_empty());
    }

    #[test]
    fn export_without_sink_fails() {
        assert!(matches!(HistoryStore::new().export(), Err(StoreError::NoSink)));
    }

    #[test]
    fn artifact_metadata_reflects_payload() {
        let store = HistoryStore::new();
        let artifact = store.put_artifact("list", json!(["a", "b"]));
        assert_eq!(artifact.metadata.data_type, "object");
        assert!(artifact.metadata.is_array);
        assert_eq!(artifact.metadata.data_size, r#"["a","b"]"#.len());
        assert_eq!(store.artifact("list"), Some(json!(["a", "b"])));
    }
}
