//! Interactive step debugger.
//!
//! [`DebugMachine`] is the pure state machine; [`StepDebugger`] drives it
//! against a [`DebugController`] that supplies operator commands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use history_store::ExecutionRecord;
use scenario_parser::{StepInfo, TestCase};
use tracing::{info, warn};

use crate::context::ExecutionContext;
use crate::errors::{DebugError, FlowError};
use crate::executor::StepExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Execute,
    Skip,
    Continue,
    Quit,
    Retry,
}

impl fmt::Display for DebugCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugCommand::Execute => "execute",
            DebugCommand::Skip => "skip",
            DebugCommand::Continue => "continue",
            DebugCommand::Quit => "quit",
            DebugCommand::Retry => "retry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugState {
    /// Waiting for a command before step `i`.
    Pending(usize),
    Running(usize),
    /// Step `i` failed; waiting for retry or skip.
    Failed(usize),
    /// Running step `i` without prompting.
    Continuous(usize),
    Finished,
    Aborted,
}

impl fmt::Display for DebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugState::Pending(i) => write!(f, "pending at step {}", i + 1),
            DebugState::Running(i) => write!(f, "running step {}", i + 1),
            DebugState::Failed(i) => write!(f, "failed at step {}", i + 1),
            DebugState::Continuous(i) => write!(f, "continuously running step {}", i + 1),
            DebugState::Finished => f.write_str("finished"),
            DebugState::Aborted => f.write_str("aborted"),
        }
    }
}

/// Step debugger transitions with a per-step retry budget.
#[derive(Debug, Clone)]
pub struct DebugMachine {
    state: DebugState,
    total: usize,
    max_retries: u32,
    retries: BTreeMap<usize, u32>,
}

impl DebugMachine {
    pub fn new(total: usize, max_retries: u32) -> Self {
        let state = if total == 0 {
            DebugState::Finished
        } else {
            DebugState::Pending(0)
        };
        Self {
            state,
            total,
            max_retries,
            retries: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> DebugState {
        self.state
    }

    pub fn retries_used(&self, step: usize) -> u32 {
        self.retries.get(&step).copied().unwrap_or(0)
    }

    fn after(&self, step: usize) -> DebugState {
        if step + 1 < self.total {
            DebugState::Pending(step + 1)
        } else {
            DebugState::Finished
        }
    }

    pub fn command(&mut self, command: DebugCommand) -> Result<DebugState, DebugError> {
        let next = match (self.state, command) {
            (DebugState::Pending(i), DebugCommand::Execute) => DebugState::Running(i),
            (DebugState::Pending(i), DebugCommand::Continue) => DebugState::Continuous(i),
            (DebugState::Pending(i) | DebugState::Failed(i), DebugCommand::Skip) => self.after(i),
            (DebugState::Pending(_) | DebugState::Failed(_), DebugCommand::Quit) => {
                DebugState::Aborted
            }
            (DebugState::Failed(i), DebugCommand::Retry) => {
                let used = self.retries_used(i);
                if used >= self.max_retries {
                    return Err(DebugError::RetryLimit {
                        step: i + 1,
                        limit: self.max_retries,
                    });
                }
                self.retries.insert(i, used + 1);
                DebugState::Pending(i)
            }
            (state, command) => {
                return Err(DebugError::InvalidCommand {
                    command: command.to_string(),
                    state: state.to_string(),
                })
            }
        };
        self.state = next;
        Ok(next)
    }

    /// Applies the outcome of the step that was running.
    pub fn complete(&mut self, success: bool) -> DebugState {
        self.state = match (self.state, success) {
            (DebugState::Running(i), true) => self.after(i),
            (DebugState::Running(i), false) => DebugState::Failed(i),
            (DebugState::Continuous(i), true) if i + 1 < self.total => DebugState::Continuous(i + 1),
            (DebugState::Continuous(_), true) => DebugState::Finished,
            (DebugState::Continuous(_), false) => DebugState::Aborted,
            (state, _) => state,
        };
        self.state
    }
}

/// What the operator sees before choosing a command.
#[derive(Debug, Clone, Copy)]
pub struct DebugPrompt<'a> {
    pub case: &'a str,
    pub index: usize,
    pub total: usize,
    pub step: &'a StepInfo,
    pub state: DebugState,
    pub last_error: Option<&'a str>,
}

#[async_trait]
pub trait DebugController: Send {
    async fn choose(&mut self, prompt: DebugPrompt<'_>) -> DebugCommand;

    fn on_record(&mut self, _index: usize, _record: &ExecutionRecord) {}

    fn on_notice(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, Default)]
pub struct DebugReport {
    pub case: String,
    pub records: Vec<ExecutionRecord>,
    pub skipped: Vec<usize>,
    pub aborted: bool,
}

pub struct StepDebugger {
    executor: Arc<StepExecutor>,
    max_retries: u32,
}

impl StepDebugger {
    pub fn new(executor: Arc<StepExecutor>, max_retries: u32) -> Self {
        Self {
            executor,
            max_retries,
        }
    }

    pub async fn debug_case(
        &self,
        case: &TestCase,
        ctx: &ExecutionContext,
        controller: &mut dyn DebugController,
    ) -> Result<DebugReport, FlowError> {
        info!(case = %case.name, steps = case.steps.len(), "debugging case");
        let mut machine = DebugMachine::new(case.steps.len(), self.max_retries);
        let mut report = DebugReport {
            case: case.name.clone(),
            ..DebugReport::default()
        };
        let mut last_error: Option<String> = None;

        loop {
            match machine.state() {
                DebugState::Pending(i) | DebugState::Failed(i) => {
                    let prompt = DebugPrompt {
                        case: &case.name,
                        index: i,
                        total: case.steps.len(),
                        step: &case.steps[i],
                        state: machine.state(),
                        last_error: last_error.as_deref(),
                    };
                    let command = controller.choose(prompt).await;
                    match machine.command(command) {
                        Ok(_) => {
                            if command == DebugCommand::Skip {
                                report.skipped.push(i);
                            }
                        }
                        Err(err @ DebugError::RetryLimit { .. }) => {
                            warn!(case = %case.name, error = %err, "retry refused, skipping step");
                            controller.on_notice(&err.to_string());
                            machine.command(DebugCommand::Skip)?;
                            report.skipped.push(i);
                        }
                        Err(err) => controller.on_notice(&err.to_string()),
                    }
                }
                DebugState::Running(i) | DebugState::Continuous(i) => {
                    let record = self.executor.execute_step(&case.steps[i], ctx).await?;
                    controller.on_record(i, &record);
                    last_error = record.outcome.error().map(str::to_string);
                    machine.complete(record.is_success());
                    report.records.push(record);
                }
                DebugState::Finished => break,
                DebugState::Aborted => {
                    report.aborted = true;
                    break;
                }
            }
        }
        Ok(report)
    }
}
