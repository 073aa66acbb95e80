use clap::Subcommand;

use super::debug::DebugArgs;
use super::explain::ExplainArgs;
use super::parse::ParseArgs;
use super::patterns::PatternsArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run scenario files against the dry-run backend
    Run(RunArgs),

    /// Step through a scenario interactively
    Debug(DebugArgs),

    /// Translate one step and show the resulting descriptor
    Explain(ExplainArgs),

    /// List the step pattern table
    Patterns(PatternsArgs),

    /// Parse a scenario file and print its cases
    Parse(ParseArgs),
}
