//! Case-level results and runner statistics

use chrono::{DateTime, Utc};
use history_store::ExecutionRecord;
use serde::{Deserialize, Serialize};

/// Lifecycle of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    NotStarted,
    Running,
    Passed,
    Failed,
}

impl CaseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseState::Passed | CaseState::Failed)
    }
}

/// The step that stopped a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub step_index: usize,
    pub action: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub name: String,
    pub state: CaseState,
    pub step_records: Vec<ExecutionRecord>,
    pub passed: bool,
    pub first_error: Option<CaseFailure>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl CaseResult {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            state: CaseState::NotStarted,
            step_records: Vec::new(),
            passed: false,
            first_error: None,
            start_time: now,
            end_time: now,
        }
    }

    pub fn start(mut self) -> Self {
        self.state = CaseState::Running;
        self.start_time = Utc::now();
        self
    }

    pub fn with_record(mut self, record: ExecutionRecord) -> Self {
        self.step_records.push(record);
        self
    }

    /// Moves to `Failed`; later steps are not run.
    pub fn with_failure(mut self, failure: CaseFailure) -> Self {
        self.state = CaseState::Failed;
        self.passed = false;
        self.first_error = Some(failure);
        self
    }

    /// Settles the final state and stamps the end time.
    pub fn finish(mut self) -> Self {
        if self.state == CaseState::Running {
            self.state = CaseState::Passed;
            self.passed = true;
        }
        self.end_time = Utc::now();
        self
    }

    pub fn duration_ms(&self) -> u64 {
        (self.end_time - self.start_time).num_milliseconds().max(0) as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerStats {
    pub total_cases: usize,
    pub passed_cases: usize,
    pub failed_cases: usize,
    pub total_steps: usize,
    pub passed_steps: usize,
    /// Percentage of passed cases, one decimal place.
    pub success_rate: f64,
}

impl RunnerStats {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let total_cases = results.len();
        let passed_cases = results.iter().filter(|r| r.passed).count();
        let total_steps = results.iter().map(|r| r.step_records.len()).sum();
        let passed_steps = results
            .iter()
            .flat_map(|r| r.step_records.iter())
            .filter(|record| record.is_success())
            .count();
        let success_rate = if total_cases > 0 {
            (passed_cases as f64 * 1000.0 / total_cases as f64).round() / 10.0
        } else {
            0.0
        };
        Self {
            total_cases,
            passed_cases,
            failed_cases: total_cases - passed_cases,
            total_steps,
            passed_steps,
            success_rate,
        }
    }
}
