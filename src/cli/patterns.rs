use anyhow::Result;
use clap::Args;
use itest_core_types::{ActionKind, TranslationEngine};
use serde::Serialize;
use step_patterns::{Pattern, PatternOrigin, PatternStats};

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct PatternsArgs {
    /// Only list patterns of this action type
    #[arg(long, value_name = "TYPE")]
    pub kind: Option<ActionKind>,
}

#[derive(Serialize)]
struct PatternRow<'a> {
    kind: ActionKind,
    name: &'a str,
    priority: i32,
    origin: PatternOrigin,
    engine: TranslationEngine,
    pattern: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a str>,
}

impl<'a> From<&'a Pattern> for PatternRow<'a> {
    fn from(pattern: &'a Pattern) -> Self {
        Self {
            kind: pattern.kind,
            name: &pattern.name,
            priority: pattern.priority,
            origin: pattern.origin,
            engine: pattern.engine,
            pattern: pattern.source(),
            description: &pattern.description,
            template: pattern.template.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct PatternListing<'a> {
    stats: PatternStats,
    patterns: Vec<PatternRow<'a>>,
}

pub async fn cmd_patterns(args: PatternsArgs, ctx: &CliContext) -> Result<()> {
    let registry = ctx.registry().await;
    let patterns: Vec<PatternRow<'_>> = match args.kind {
        Some(kind) => registry.patterns_for(kind).iter().map(PatternRow::from).collect(),
        None => registry.iter().map(PatternRow::from).collect(),
    };
    let listing = PatternListing {
        stats: registry.stats(),
        patterns,
    };
    if ctx.output().emit(&listing)? {
        return Ok(());
    }

    let mut current = None;
    for row in &listing.patterns {
        if current != Some(row.kind) {
            println!("[{}]", row.kind);
            current = Some(row.kind);
        }
        let origin = match row.origin {
            PatternOrigin::Builtin => "builtin",
            PatternOrigin::Custom => "custom",
        };
        println!(
            "  {:>4}  {:<24} {:<8} {:<7} {}",
            row.priority, row.name, origin, row.engine.as_str(), row.description
        );
    }
    let stats = &listing.stats;
    println!();
    println!(
        "{} patterns ({} builtin, {} custom)",
        stats.total, stats.builtin, stats.custom
    );
    Ok(())
}
