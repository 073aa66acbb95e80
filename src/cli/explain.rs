use anyhow::Result;
use clap::Args;
use serde::Serialize;
use step_translator::{check, describe, ActionDescriptor};

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ExplainArgs {
    /// Step text, exactly as it would appear in a scenario
    pub step: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Explanation<'a> {
    descriptor: &'a ActionDescriptor,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<String>,
    description: String,
}

pub async fn cmd_explain(args: ExplainArgs, ctx: &CliContext) -> Result<()> {
    let translator = ctx.translator().await;
    let variables = ctx.variables().await;
    let descriptor = translator.translate(&args.step, &variables);
    let verdict = check(&descriptor);
    let explanation = Explanation {
        descriptor: &descriptor,
        valid: verdict.is_ok(),
        invalid_reason: verdict.err().map(|err| err.to_string()),
        description: describe(&descriptor),
    };
    if ctx.output().emit(&explanation)? {
        return Ok(());
    }

    println!("Step:        {}", descriptor.original_text);
    if descriptor.resolved_text != descriptor.original_text {
        println!("Resolved:    {}", descriptor.resolved_text);
    }
    println!("Type:        {}", descriptor.kind);
    println!("Engine:      {}", descriptor.engine);
    println!(
        "Rule:        {}{}",
        descriptor.rule_name(),
        if descriptor.is_builtin { " (builtin)" } else { "" }
    );
    if let Some(pattern) = &descriptor.matched_pattern {
        println!("Pattern:     {pattern}");
    }
    if !descriptor.params.is_empty() {
        println!("Params:");
        for (name, value) in &descriptor.params {
            println!("  {name} = {value}");
        }
    }
    if !descriptor.captured_variables.is_empty() {
        println!("Variables:");
        for (name, value) in &descriptor.captured_variables {
            println!("  %{name}% = {value}");
        }
    }
    if let Some(code) = &descriptor.generated_code {
        println!("Script:");
        for line in code.lines() {
            println!("  {line}");
        }
    }
    match &explanation.invalid_reason {
        None => println!("Valid:       yes"),
        Some(reason) => println!("Valid:       no ({reason})"),
    }
    println!("Summary:     {}", explanation.description);
    Ok(())
}
