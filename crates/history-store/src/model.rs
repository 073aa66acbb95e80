use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use itest_core_types::{ActionKind, ExecutionId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use step_translator::ActionDescriptor;

/// Schema version stamped on every export bundle.
pub const STORE_SCHEMA_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success { result: Value },
    Failure { error: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Failure { error } => Some(error),
            ExecutionOutcome::Success { .. } => None,
        }
    }
}

/// One dispatched step; never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub descriptor: ActionDescriptor,
    pub outcome: ExecutionOutcome,
    pub duration_ms: u64,
    pub workflow_id: WorkflowId,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn new(
        descriptor: ActionDescriptor,
        outcome: ExecutionOutcome,
        duration_ms: u64,
        workflow_id: WorkflowId,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            descriptor,
            outcome,
            duration_ms,
            workflow_id,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn kind(&self) -> ActionKind {
        self.descriptor.kind
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    /// JSON type name of the payload (`object`, `string`, ...).
    pub data_type: String,
    /// Length of the compact JSON encoding.
    pub data_size: usize,
    pub is_array: bool,
}

impl ArtifactMetadata {
    pub fn describe(data: &Value) -> Self {
        let data_type = match data {
            Value::Null | Value::Object(_) | Value::Array(_) => "object",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
        };
        Self {
            data_type: data_type.to_string(),
            data_size: data.to_string().len(),
            is_array: data.is_array(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArtifact {
    pub key: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub metadata: ArtifactMetadata,
}

impl ExtractedArtifact {
    pub fn new(key: impl Into<String>, data: Value) -> Self {
        let metadata = ArtifactMetadata::describe(&data);
        Self {
            key: key.into(),
            data,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSummary {
    pub total: usize,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub execution_types: BTreeMap<ActionKind, usize>,
    pub extracted_data: ExtractedSummary,
    /// Mean duration of successful runs, rounded to whole milliseconds.
    pub average_duration: u64,
    /// Rounded percentage, 0 when nothing has run.
    pub success_rate: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStep {
    pub kind: ActionKind,
    pub action: String,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&ExecutionRecord> for RecentStep {
    fn from(record: &ExecutionRecord) -> Self {
        Self {
            kind: record.kind(),
            action: record.descriptor.original_text.clone(),
            success: record.is_success(),
            duration_ms: record.duration_ms,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub extracted_data: BTreeMap<String, Value>,
    pub execution_history: Vec<ExecutionRecord>,
    pub stats: HistoryStats,
    pub export_timestamp: DateTime<Utc>,
    pub version: String,
}
