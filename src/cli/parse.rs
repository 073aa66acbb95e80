use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use itest_core_types::WorkflowId;
use scenario_parser::{parse_file, TestCase};
use serde::Serialize;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Scenario file to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Serialize)]
struct ParsedScenario<'a> {
    workflow: &'a WorkflowId,
    cases: &'a [TestCase],
}

pub async fn cmd_parse(args: ParseArgs, ctx: &CliContext) -> Result<()> {
    let (workflow, cases) = parse_file(&args.file)
        .with_context(|| format!("Failed to load scenario {}", args.file.display()))?;
    let parsed = ParsedScenario {
        workflow: &workflow,
        cases: &cases,
    };
    if ctx.output().emit(&parsed)? {
        return Ok(());
    }

    println!("Workflow: {workflow}");
    for case in &cases {
        println!();
        println!("## {} ({} steps)", case.name, case.steps.len());
        for comment in &case.comments {
            println!("   # {comment}");
        }
        for (index, step) in case.steps.iter().enumerate() {
            match &step.comment {
                Some(comment) => println!("  {:>2}. {}  # {comment}", index + 1, step.action),
                None => println!("  {:>2}. {}", index + 1, step.action),
            }
        }
    }
    Ok(())
}
