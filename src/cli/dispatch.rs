use super::debug::cmd_debug;
use super::env::CliArgs;
use super::explain::cmd_explain;
use super::parse::cmd_parse;
use super::patterns::cmd_patterns;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Debug(args) => cmd_debug(args, ctx).await,
        Commands::Explain(args) => cmd_explain(args, ctx).await,
        Commands::Patterns(args) => cmd_patterns(args, ctx).await,
        Commands::Parse(args) => cmd_parse(args, ctx).await,
    }
}
