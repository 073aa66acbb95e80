mod common;

use std::sync::Arc;

use action_flow::{
    CaseState, DebugCommand, DebugController, DebugPrompt, StepDebugger, TestCaseRunner,
};
use async_trait::async_trait;
use common::harness;
use history_store::ExecutionRecord;
use itest_core_types::WorkflowId;
use scenario_parser::parse_scenario;

const SCENARIO: &str = "\
## 结账
点击 商品
点击 坏掉的按钮
点击 支付

## 浏览
打开 https://shop.test
点击 分类
";

#[test]
fn fail_fast_stops_after_first_failure() {
    let h = harness();
    h.session.fail_act("点击 坏掉的按钮");
    let runner = TestCaseRunner::new(h.executor.clone());
    let cases = parse_scenario(SCENARIO, &WorkflowId::new("shop-flow"));

    let result = tokio_test::block_on(runner.run_case(&cases[0], &h.ctx)).unwrap();
    assert!(!result.passed);
    assert_eq!(result.state, CaseState::Failed);
    assert_eq!(result.step_records.len(), 2);
    let failure = result.first_error.unwrap();
    assert_eq!(failure.step_index, 1);
    assert_eq!(failure.action, "点击 坏掉的按钮");
    assert!(failure.error.contains("could not"));
    assert!(!h.session.calls().iter().any(|c| c.contains("支付")));
}

#[test]
fn stats_aggregate_over_all_cases() {
    let h = harness();
    h.session.fail_act("点击 坏掉的按钮");
    let runner = TestCaseRunner::new(h.executor.clone());
    let cases = parse_scenario(SCENARIO, &WorkflowId::new("shop-flow"));

    let results = tokio_test::block_on(runner.run_all(&cases, &h.ctx)).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[1].passed);
    assert_eq!(results[1].state, CaseState::Passed);

    let stats = runner.stats();
    assert_eq!(stats.total_cases, 2);
    assert_eq!(stats.passed_cases, 1);
    assert_eq!(stats.failed_cases, 1);
    assert_eq!(stats.total_steps, 4);
    assert_eq!(stats.passed_steps, 3);
    assert_eq!(stats.success_rate, 50.0);
    assert_eq!(h.store.stats().total_executions, 4);
}

/// Replays a fixed list of commands.
struct Scripted {
    commands: Vec<DebugCommand>,
    seen: Vec<usize>,
}

#[async_trait]
impl DebugController for Scripted {
    async fn choose(&mut self, prompt: DebugPrompt<'_>) -> DebugCommand {
        self.seen.push(prompt.index);
        if self.commands.is_empty() {
            DebugCommand::Quit
        } else {
            self.commands.remove(0)
        }
    }

    fn on_record(&mut self, _index: usize, _record: &ExecutionRecord) {}
}

#[test]
fn debugger_retries_in_place_then_skips_at_limit() {
    let h = harness();
    h.session.fail_act("点击 坏掉的按钮");
    let cases = parse_scenario(SCENARIO, &WorkflowId::new("shop-flow"));
    let debugger = StepDebugger::new(Arc::clone(&h.executor), 1);
    let mut controller = Scripted {
        commands: vec![
            DebugCommand::Execute,
            DebugCommand::Execute,
            DebugCommand::Retry,
            DebugCommand::Execute,
            DebugCommand::Retry,
            DebugCommand::Skip,
        ],
        seen: Vec::new(),
    };

    let report =
        tokio_test::block_on(debugger.debug_case(&cases[0], &h.ctx, &mut controller)).unwrap();
    assert!(!report.aborted);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.skipped, vec![1, 2]);
    assert_eq!(controller.seen, vec![0, 1, 1, 1, 1, 2]);
}

#[test]
fn debugger_records_skip_of_a_failed_step() {
    let h = harness();
    h.session.fail_act("点击 坏掉的按钮");
    let cases = parse_scenario(SCENARIO, &WorkflowId::new("shop-flow"));
    let debugger = StepDebugger::new(Arc::clone(&h.executor), 3);
    let mut controller = Scripted {
        commands: vec![
            DebugCommand::Execute,
            DebugCommand::Execute,
            DebugCommand::Skip,
            DebugCommand::Execute,
        ],
        seen: Vec::new(),
    };

    let report =
        tokio_test::block_on(debugger.debug_case(&cases[0], &h.ctx, &mut controller)).unwrap();
    assert!(!report.aborted);
    assert_eq!(report.skipped, vec![1]);
    assert_eq!(report.records.len(), 3);
    assert!(report.records[2].is_success());
    assert_eq!(controller.seen, vec![0, 1, 1, 2]);
}

#[test]
fn debugger_continue_aborts_on_failure() {
    let h = harness();
    h.session.fail_act("点击 坏掉的按钮");
    let cases = parse_scenario(SCENARIO, &WorkflowId::new("shop-flow"));
    let debugger = StepDebugger::new(Arc::clone(&h.executor), 3);
    let mut controller = Scripted {
        commands: vec![DebugCommand::Continue],
        seen: Vec::new(),
    };

    let report =
        tokio_test::block_on(debugger.debug_case(&cases[0], &h.ctx, &mut controller)).unwrap();
    assert!(report.aborted);
    assert_eq!(report.records.len(), 2);
}
