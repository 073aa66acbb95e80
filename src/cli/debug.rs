use std::path::PathBuf;

use action_flow::{DebugCommand, DebugController, DebugPrompt, DebugState, StepDebugger};
use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use history_store::ExecutionRecord;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use super::context::CliContext;
use super::run::{export_on_shutdown, load_cases};

#[derive(Args, Clone, Debug)]
pub struct DebugArgs {
    /// Scenario file to step through
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Only debug the case with this name
    #[arg(long)]
    pub case: Option<String>,
}

pub async fn cmd_debug(args: DebugArgs, ctx: &CliContext) -> Result<()> {
    let cases = load_cases(
        std::slice::from_ref(&args.file),
        args.case.as_deref(),
        &ctx.config().cache_dir,
    )?;
    let bench = ctx.workbench().await;
    let debugger = StepDebugger::new(bench.executor.clone(), ctx.config().max_debug_retries);
    let mut controller = StdinController::new();

    for case in &cases {
        println!("== {} ({} steps)", case.name, case.steps.len());
        for comment in &case.comments {
            println!("   # {comment}");
        }
        let report = debugger.debug_case(case, &bench.exec, &mut controller).await?;
        let failed = report.records.iter().filter(|r| !r.is_success()).count();
        println!(
            "== {}: {} executed, {} failed, {} skipped{}",
            report.case,
            report.records.len(),
            failed,
            report.skipped.len(),
            if report.aborted { ", aborted" } else { "" }
        );
        if controller.quit {
            info!(case = %case.name, "debug session ended by operator");
            break;
        }
    }

    if let Some(path) = export_on_shutdown(&bench.store) {
        println!("Export: {}", path.display());
    }
    Ok(())
}

/// Maps operator input to a command for the given state.
///
/// Pending steps take `e`/`s`/`c`/`q`; a failed step asks for retry with `y`/`n`/`q`.
pub fn parse_command(input: &str, state: DebugState) -> Option<DebugCommand> {
    let input = input.trim().to_lowercase();
    match state {
        DebugState::Failed(_) => match input.as_str() {
            "y" | "yes" | "r" | "retry" => Some(DebugCommand::Retry),
            "n" | "no" | "s" | "skip" => Some(DebugCommand::Skip),
            "q" | "quit" => Some(DebugCommand::Quit),
            _ => None,
        },
        _ => match input.as_str() {
            "" | "e" | "execute" => Some(DebugCommand::Execute),
            "s" | "skip" => Some(DebugCommand::Skip),
            "c" | "continue" => Some(DebugCommand::Continue),
            "q" | "quit" => Some(DebugCommand::Quit),
            _ => None,
        },
    }
}

struct StdinController {
    lines: Lines<BufReader<Stdin>>,
    quit: bool,
}

impl StdinController {
    fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
            quit: false,
        }
    }
}

#[async_trait]
impl DebugController for StdinController {
    async fn choose(&mut self, prompt: DebugPrompt<'_>) -> DebugCommand {
        println!(
            "-- [{}/{}] {}",
            prompt.index + 1,
            prompt.total,
            prompt.step.action
        );
        if let Some(comment) = &prompt.step.comment {
            println!("   # {comment}");
        }
        loop {
            match prompt.state {
                DebugState::Failed(_) => {
                    if let Some(error) = prompt.last_error {
                        println!("   error: {error}");
                    }
                    println!("   retry? [y]es / [n]o / [q]uit");
                }
                _ => println!("   [e]xecute / [s]kip / [c]ontinue / [q]uit"),
            }
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                // closed stdin ends the session
                Ok(None) | Err(_) => {
                    self.quit = true;
                    return DebugCommand::Quit;
                }
            };
            if let Some(command) = parse_command(&line, prompt.state) {
                if command == DebugCommand::Quit {
                    self.quit = true;
                }
                return command;
            }
            println!("   unknown command: {}", line.trim());
        }
    }

    fn on_record(&mut self, index: usize, record: &ExecutionRecord) {
        match record.outcome.error() {
            None => println!("   step {} ok ({}ms)", index + 1, record.duration_ms),
            Some(error) => {
                println!("   step {} failed ({}ms)", index + 1, record.duration_ms);
                for line in error.lines() {
                    println!("     {line}");
                }
            }
        }
    }

    fn on_notice(&mut self, message: &str) {
        println!("   {message}");
    }
}
