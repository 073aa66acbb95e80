//! Fail-fast test case runner

use std::sync::Arc;

use parking_lot::Mutex;
use scenario_parser::TestCase;
use tracing::{info, warn};

use crate::context::ExecutionContext;
use crate::errors::FlowError;
use crate::executor::StepExecutor;
use crate::types::{CaseFailure, CaseResult, RunnerStats};

/// Runs cases step by step and keeps their results for aggregate stats.
pub struct TestCaseRunner {
    executor: Arc<StepExecutor>,
    results: Mutex<Vec<CaseResult>>,
}

impl TestCaseRunner {
    pub fn new(executor: Arc<StepExecutor>) -> Self {
        Self {
            executor,
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn executor(&self) -> &Arc<StepExecutor> {
        &self.executor
    }

    /// Steps run strictly in order; the first failed record ends the case.
    pub async fn run_case(
        &self,
        case: &TestCase,
        ctx: &ExecutionContext,
    ) -> Result<CaseResult, FlowError> {
        info!(case = %case.name, steps = case.steps.len(), "case started");
        let mut result = CaseResult::new(&case.name).start();

        for (index, step) in case.steps.iter().enumerate() {
            let record = self.executor.execute_step(step, ctx).await?;
            let failure = record.outcome.error().map(|error| CaseFailure {
                step_index: index,
                action: step.action.clone(),
                error: error.to_string(),
            });
            result = result.with_record(record);
            if let Some(failure) = failure {
                warn!(
                    case = %case.name,
                    step = index + 1,
                    action = %failure.action,
                    "case failed"
                );
                result = result.with_failure(failure);
                break;
            }
        }

        let result = result.finish();
        info!(
            case = %case.name,
            passed = result.passed,
            duration_ms = result.duration_ms(),
            "case finished"
        );
        self.results.lock().push(result.clone());
        Ok(result)
    }

    /// Cases run one after another; a session failure stops the batch.
    pub async fn run_all(
        &self,
        cases: &[TestCase],
        ctx: &ExecutionContext,
    ) -> Result<Vec<CaseResult>, FlowError> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.run_case(case, ctx).await?);
        }
        Ok(results)
    }

    pub fn results(&self) -> Vec<CaseResult> {
        self.results.lock().clone()
    }

    pub fn stats(&self) -> RunnerStats {
        RunnerStats::from_results(&self.results.lock())
    }
}
