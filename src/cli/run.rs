use std::path::{Path, PathBuf};

use action_flow::{CaseResult, RunnerStats, TestCaseRunner};
use anyhow::{bail, Context, Result};
use clap::Args;
use history_store::HistoryStore;
use scenario_parser::{ensure_workflow_dir, parse_file, TestCase};
use serde::Serialize;
use tracing::{info, warn};

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Scenario files to execute
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Only run the case with this name
    #[arg(long)]
    pub case: Option<String>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    results: &'a [CaseResult],
    stats: &'a RunnerStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<&'a Path>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    info!(config = %ctx.config_path().display(), files = args.files.len(), "run requested");
    let cases = load_cases(&args.files, args.case.as_deref(), &ctx.config().cache_dir)?;

    let bench = ctx.workbench().await;
    let runner = TestCaseRunner::new(bench.executor.clone());
    let outcome = runner.run_all(&cases, &bench.exec).await;
    let export = export_on_shutdown(&bench.store);
    outcome.context("scenario run aborted")?;

    let results = runner.results();
    let stats = runner.stats();
    let report = RunReport {
        results: &results,
        stats: &stats,
        export: export.as_deref(),
    };
    if !ctx.output().emit(&report)? {
        print_human(&results, &stats, export.as_deref());
    }

    if stats.failed_cases > 0 {
        bail!("{} of {} cases failed", stats.failed_cases, stats.total_cases);
    }
    Ok(())
}

/// Parses every file in order, creating each workflow's cache directory.
pub(crate) fn load_cases(
    files: &[PathBuf],
    only: Option<&str>,
    cache_dir: &Path,
) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for file in files {
        let (workflow, parsed) = parse_file(file)
            .with_context(|| format!("Failed to load scenario {}", file.display()))?;
        ensure_workflow_dir(cache_dir, &workflow)
            .with_context(|| format!("Failed to prepare cache for {workflow}"))?;
        info!(file = %file.display(), workflow = %workflow, cases = parsed.len(), "scenario loaded");
        cases.extend(parsed);
    }
    if let Some(name) = only {
        cases.retain(|case| case.name == name);
        if cases.is_empty() {
            bail!("no case named '{name}'");
        }
    }
    Ok(cases)
}

/// Flushes the export bundle when the store persists; failures are logged only.
pub(crate) fn export_on_shutdown(store: &HistoryStore) -> Option<PathBuf> {
    if !store.persists() {
        return None;
    }
    match store.export() {
        Ok(path) => {
            info!(path = %path.display(), records = store.len(), "history exported");
            Some(path)
        }
        Err(err) => {
            warn!(error = %err, "history export failed");
            None
        }
    }
}

fn print_human(results: &[CaseResult], stats: &RunnerStats, export: Option<&Path>) {
    for result in results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "[{mark}] {} ({} steps, {}ms)",
            result.name,
            result.step_records.len(),
            result.duration_ms()
        );
        if let Some(failure) = &result.first_error {
            println!("       step {}: {}", failure.step_index + 1, failure.action);
            for line in failure.error.lines() {
                println!("       {line}");
            }
        }
    }
    println!();
    println!(
        "Cases: {} passed, {} failed, {} total ({:.1}%)",
        stats.passed_cases, stats.failed_cases, stats.total_cases, stats.success_rate
    );
    println!("Steps: {} of {} passed", stats.passed_steps, stats.total_steps);
    if let Some(path) = export {
        println!("Export: {}", path.display());
    }
}
