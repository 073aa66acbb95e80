//! Scripted-step interpreter.
//!
//! Rule templates render into a small line-oriented script rather than host
//! code. One command per line, arguments are bare words or double-quoted
//! strings (`\"` and `\\` escapes). Commands that take a single text argument
//! join the rest of the line, so `act press enter in 搜索框` needs no quotes.
//! Blank lines and `//` comments are skipped.
//!
//! ```text
//! navigate "https://shop.test"
//! act "click the login button"
//! wait_for "#dashboard" 5000
//! expect_title_contains "Dashboard"
//! ```

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::backend::{ActOptions, AgentTaskRequest, AutomationSession, ShapeHint};
use crate::errors::{BackendError, ScriptError};

const DEFAULT_WAIT_FOR_MS: u64 = 5_000;
const WAIT_FOR_POLL_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Navigate(String),
    Reload,
    Back,
    Act(String),
    Extract(String),
    Observe(String),
    Agent(String),
    Wait(u64),
    WaitFor { element: String, timeout_ms: u64 },
    ExpectTitleContains(String),
    ExpectVisible(String),
    ExpectText { element: String, expected: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: ScriptCommand,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub lines: Vec<ScriptLine>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptReport {
    pub executed: usize,
    pub outputs: Vec<Value>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut lines = Vec::new();
        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with("//") {
                continue;
            }
            let tokens = tokenize(text).map_err(|reason| ScriptError::Syntax { line, reason })?;
            let command = build_command(line, &tokens)?;
            lines.push(ScriptLine { line, command });
        }
        if lines.is_empty() {
            return Err(ScriptError::Syntax {
                line: 0,
                reason: "script has no commands".to_string(),
            });
        }
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Runs every command in order, stopping at the first failure.
    pub async fn run(
        &self,
        session: &dyn AutomationSession,
        agent_max_steps: u32,
    ) -> Result<ScriptReport, ScriptError> {
        let mut report = ScriptReport::default();
        for entry in &self.lines {
            debug!(line = entry.line, command = ?entry.command, "script command");
            let output = run_command(session, entry, agent_max_steps).await?;
            report.executed += 1;
            if !output.is_null() {
                report.outputs.push(output);
            }
        }
        Ok(report)
    }
}

async fn run_command(
    session: &dyn AutomationSession,
    entry: &ScriptLine,
    agent_max_steps: u32,
) -> Result<Value, ScriptError> {
    let line = entry.line;
    let backend = |source: BackendError| ScriptError::Backend { line, source };
    let assertion = |message: String| ScriptError::Assertion { line, message };

    match &entry.command {
        ScriptCommand::Navigate(url) => {
            session.navigate(url).await.map_err(backend)?;
            Ok(Value::Null)
        }
        ScriptCommand::Reload => {
            session.reload().await.map_err(backend)?;
            Ok(Value::Null)
        }
        ScriptCommand::Back => {
            session.go_back().await.map_err(backend)?;
            Ok(Value::Null)
        }
        ScriptCommand::Act(instruction) => session
            .act(instruction, &ActOptions::generic(Default::default()))
            .await
            .map_err(backend),
        ScriptCommand::Extract(target) => session
            .extract(target, ShapeHint::classify(target))
            .await
            .map_err(backend),
        ScriptCommand::Observe(target) => {
            let elements = session.observe(target).await.map_err(backend)?;
            Ok(json!({ "target": target, "count": elements.len() }))
        }
        ScriptCommand::Agent(instruction) => {
            let request = AgentTaskRequest::new(instruction.clone(), agent_max_steps);
            let result = session.run_agent_task(&request).await.map_err(backend)?;
            Ok(json!({ "completed": result.completed, "result": result.result }))
        }
        ScriptCommand::Wait(ms) => {
            sleep(Duration::from_millis(*ms)).await;
            Ok(Value::Null)
        }
        ScriptCommand::WaitFor {
            element,
            timeout_ms,
        } => {
            let deadline = Instant::now() + Duration::from_millis(*timeout_ms);
            loop {
                if !session.observe(element).await.map_err(backend)?.is_empty() {
                    return Ok(Value::Null);
                }
                if Instant::now() >= deadline {
                    return Err(assertion(format!(
                        "'{element}' did not appear within {timeout_ms}ms"
                    )));
                }
                sleep(Duration::from_millis(WAIT_FOR_POLL_MS)).await;
            }
        }
        ScriptCommand::ExpectTitleContains(expected) => {
            let title = session.title().await.map_err(backend)?;
            if title.contains(expected.as_str()) {
                Ok(Value::Null)
            } else {
                Err(assertion(format!(
                    "expected title '{title}' to contain '{expected}'"
                )))
            }
        }
        ScriptCommand::ExpectVisible(element) => {
            if session.observe(element).await.map_err(backend)?.is_empty() {
                Err(assertion(format!("expected '{element}' to be visible")))
            } else {
                Ok(Value::Null)
            }
        }
        ScriptCommand::ExpectText { element, expected } => {
            let data = session
                .extract(element, ShapeHint::Text)
                .await
                .map_err(backend)?;
            let actual = match &data {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            if actual.contains(expected.as_str()) {
                Ok(Value::Null)
            } else {
                Err(assertion(format!(
                    "expected '{element}' text '{actual}' to contain '{expected}'"
                )))
            }
        }
    }
}

fn build_command(line: usize, tokens: &[String]) -> Result<ScriptCommand, ScriptError> {
    let (name, args) = match tokens.split_first() {
        Some((name, args)) => (name.as_str(), args),
        None => {
            return Err(ScriptError::Syntax {
                line,
                reason: "empty command".to_string(),
            })
        }
    };
    let arity = |expected: usize| -> Result<(), ScriptError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ScriptError::Syntax {
                line,
                reason: format!("{name} takes {expected} argument(s), got {}", args.len()),
            })
        }
    };
    let rest = || -> Result<String, ScriptError> {
        if args.is_empty() {
            Err(ScriptError::Syntax {
                line,
                reason: format!("{name} takes 1 argument(s), got 0"),
            })
        } else {
            Ok(args.join(" "))
        }
    };
    let millis = |raw: &str| -> Result<u64, ScriptError> {
        raw.parse().map_err(|_| ScriptError::Syntax {
            line,
            reason: format!("'{raw}' is not a duration in milliseconds"),
        })
    };

    let command = match name {
        "navigate" => ScriptCommand::Navigate(rest()?),
        "reload" => {
            arity(0)?;
            ScriptCommand::Reload
        }
        "back" => {
            arity(0)?;
            ScriptCommand::Back
        }
        "act" => ScriptCommand::Act(rest()?),
        "extract" => ScriptCommand::Extract(rest()?),
        "observe" => ScriptCommand::Observe(rest()?),
        "agent" => ScriptCommand::Agent(rest()?),
        "wait" => {
            arity(1)?;
            ScriptCommand::Wait(millis(&args[0])?)
        }
        "wait_for" => {
            let timeout_ms = match args.len() {
                1 => DEFAULT_WAIT_FOR_MS,
                2 => millis(&args[1])?,
                _ => arity(1).map(|_| DEFAULT_WAIT_FOR_MS)?,
            };
            ScriptCommand::WaitFor {
                element: args[0].clone(),
                timeout_ms,
            }
        }
        "expect_title_contains" => ScriptCommand::ExpectTitleContains(rest()?),
        "expect_visible" => ScriptCommand::ExpectVisible(rest()?),
        "expect_text" => {
            arity(2)?;
            ScriptCommand::ExpectText {
                element: args[0].clone(),
                expected: args[1].clone(),
            }
        }
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            })
        }
    };
    Ok(command)
}

fn tokenize(text: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if ch == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => return Err("dangling escape".to_string()),
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => token.push(other),
                }
            }
            if !closed {
                return Err("unterminated string".to_string());
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AgentTaskResult, ObservedElement};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Page on which nothing ever becomes visible.
    #[derive(Default)]
    struct EmptyPage {
        observed: Mutex<usize>,
    }

    #[async_trait]
    impl AutomationSession for EmptyPage {
        async fn navigate(&self, _url: &str) -> Result<(), BackendError> {
            Ok(())
        }
        async fn go_back(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn reload(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn title(&self) -> Result<String, BackendError> {
            Ok(String::new())
        }
        async fn act(&self, _instruction: &str, _options: &ActOptions) -> Result<Value, BackendError> {
            Ok(Value::Null)
        }
        async fn extract(&self, _target: &str, _shape: ShapeHint) -> Result<Value, BackendError> {
            Ok(Value::Null)
        }
        async fn observe(&self, _target: &str) -> Result<Vec<ObservedElement>, BackendError> {
            *self.observed.lock() += 1;
            Ok(Vec::new())
        }
        async fn run_agent_task(
            &self,
            _request: &AgentTaskRequest,
        ) -> Result<AgentTaskResult, BackendError> {
            Ok(AgentTaskResult::default())
        }
    }

    #[test]
    fn parses_quoted_and_bare_arguments() {
        let script = Script::parse(
            "// login check\nnavigate \"https://x.test\"\n\nwait 100\nexpect_text \"标题\" \"欢迎 \\\"回来\\\"\"",
        )
        .unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(script.lines[0].command, ScriptCommand::Navigate("https://x.test".into()));
        assert_eq!(script.lines[1].command, ScriptCommand::Wait(100));
        assert_eq!(script.lines[1].line, 4);
        assert_eq!(
            script.lines[2].command,
            ScriptCommand::ExpectText {
                element: "标题".into(),
                expected: "欢迎 \"回来\"".into(),
            }
        );
    }

    #[test]
    fn wait_for_defaults_timeout() {
        let script = Script::parse("wait_for \"#main\"").unwrap();
        assert_eq!(
            script.lines[0].command,
            ScriptCommand::WaitFor {
                element: "#main".into(),
                timeout_ms: DEFAULT_WAIT_FOR_MS,
            }
        );
    }

    #[test]
    fn rejects_unknown_command_with_line() {
        let err = Script::parse("reload\neval \"alert(1)\"").unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownCommand {
                line: 2,
                command: "eval".into(),
            }
        );
    }

    #[test]
    fn text_commands_take_the_rest_of_the_line() {
        let script = Script::parse(
            "act press enter in 搜索框\nexpect_title_contains Order \"#42\"\nobserve \"cart badge\"",
        )
        .unwrap();
        assert_eq!(
            script.lines[0].command,
            ScriptCommand::Act("press enter in 搜索框".into())
        );
        assert_eq!(
            script.lines[1].command,
            ScriptCommand::ExpectTitleContains("Order #42".into())
        );
        assert_eq!(script.lines[2].command, ScriptCommand::Observe("cart badge".into()));
        assert!(matches!(
            Script::parse("act"),
            Err(ScriptError::Syntax { line: 1, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_gives_up_on_the_paused_clock() {
        let session = EmptyPage::default();
        let script = Script::parse("wait_for \"#spinner\" 1000").unwrap();
        let err = script.run(&session, 1).await.unwrap_err();
        assert!(matches!(err, ScriptError::Assertion { line: 1, .. }));
        assert_eq!(*session.observed.lock(), 5);
    }

    #[test]
    fn rejects_bad_arity_and_unterminated_strings() {
        assert!(matches!(
            Script::parse("expect_text \"only-one\""),
            Err(ScriptError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            Script::parse("act \"never closed"),
            Err(ScriptError::Syntax { line: 1, .. })
        ));
        assert!(Script::parse("  \n// nothing\n").is_err());
    }
}
