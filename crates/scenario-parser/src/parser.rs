//! Line scanner for scenario documents.
//!
//! Grammar, applied per trimmed line:
//! - `## name` opens a new case; lines before the first case are ignored.
//! - `# note` inside a case records a case note and becomes the pending comment
//!   for the next step.
//! - Any other line starting with `#` is ignored.
//! - Everything else is a step; `action # note` carries an inline comment that
//!   takes precedence over the pending one.

use std::fs;
use std::path::Path;

use itest_core_types::WorkflowId;
use tracing::debug;

use crate::errors::ScenarioError;
use crate::model::{StepInfo, TestCase};

const CASE_PREFIX: &str = "## ";
const COMMENT_PREFIX: &str = "# ";
const INLINE_COMMENT: &str = " # ";

/// Parses scenario text; every step is bound to `workflow`.
pub fn parse_scenario(text: &str, workflow: &WorkflowId) -> Vec<TestCase> {
    let mut cases: Vec<TestCase> = Vec::new();
    let mut pending: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix(CASE_PREFIX) {
            cases.push(TestCase::new(name.trim()));
            pending = None;
            continue;
        }

        let Some(current) = cases.last_mut() else {
            continue;
        };

        if let Some(note) = line.strip_prefix(COMMENT_PREFIX) {
            let note = note.trim().to_string();
            current.comments.push(note.clone());
            pending = Some(note);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let (action, inline) = split_step_line(line);
        if action.is_empty() {
            continue;
        }
        let mut step = StepInfo::new(action, workflow.clone());
        step.comment = inline.or_else(|| pending.take());
        pending = None;
        current.steps.push(step);
    }

    debug!(
        workflow = %workflow,
        cases = cases.len(),
        steps = cases.iter().map(|c| c.steps.len()).sum::<usize>(),
        "parsed scenario"
    );
    cases
}

/// Splits `action # note` at the first inline comment marker.
pub fn split_step_line(line: &str) -> (String, Option<String>) {
    match line.split_once(INLINE_COMMENT) {
        Some((action, note)) => {
            let note = note.trim();
            let note = (!note.is_empty()).then(|| note.to_string());
            (action.trim().to_string(), note)
        }
        None => (line.trim().to_string(), None),
    }
}

/// Reads and parses a scenario file, deriving its workflow from the file name.
pub fn parse_file(path: &Path) -> Result<(WorkflowId, Vec<TestCase>), ScenarioError> {
    let workflow = workflow_for_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((workflow.clone(), parse_scenario(&text, &workflow)))
}

/// `Login.txt` becomes `login-flow`.
pub fn workflow_for_path(path: &Path) -> Result<WorkflowId, ScenarioError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScenarioError::InvalidPath(path.to_path_buf()))?;
    Ok(WorkflowId::new(format!("{}-flow", stem.to_lowercase())))
}

/// Creates `<cache_dir>/<workflow>` when missing.
pub fn ensure_workflow_dir(cache_dir: &Path, workflow: &WorkflowId) -> Result<(), ScenarioError> {
    let dir = cache_dir.join(workflow.as_str());
    fs::create_dir_all(&dir).map_err(|source| ScenarioError::Io { path: dir, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> WorkflowId {
        WorkflowId::new("login-flow")
    }

    #[test]
    fn single_case_with_two_steps() {
        let cases = parse_scenario(
            "## 登录\n打开 https://example.com\n点击登录按钮\n",
            &flow(),
        );
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "登录");
        let actions: Vec<_> = cases[0].steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, vec!["打开 https://example.com", "点击登录按钮"]);
        assert!(cases[0].steps.iter().all(|s| s.workflow == flow()));
    }

    #[test]
    fn lines_before_first_case_are_ignored() {
        let cases = parse_scenario("点击 A\n# note\n## case\n点击 B", &flow());
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].steps.len(), 1);
        assert!(cases[0].comments.is_empty());
    }

    #[test]
    fn pending_comment_attaches_to_next_step_only() {
        let cases = parse_scenario("## c\n# 先登录\n点击 A\n点击 B", &flow());
        let steps = &cases[0].steps;
        assert_eq!(steps[0].comment.as_deref(), Some("先登录"));
        assert_eq!(steps[1].comment, None);
        assert_eq!(cases[0].comments, vec!["先登录".to_string()]);
    }

    #[test]
    fn inline_comment_wins_over_pending() {
        let cases = parse_scenario("## c\n# block\n点击 A # inline", &flow());
        let step = &cases[0].steps[0];
        assert_eq!(step.action, "点击 A");
        assert_eq!(step.comment.as_deref(), Some("inline"));
    }

    #[test]
    fn hash_without_space_is_not_split() {
        let (action, note) = split_step_line("点击 #submit");
        assert_eq!(action, "点击 #submit");
        assert!(note.is_none());
    }

    #[test]
    fn bare_hash_lines_are_skipped() {
        let cases = parse_scenario("## c\n#disabled step\n点击 A", &flow());
        assert_eq!(cases[0].steps.len(), 1);
        assert!(cases[0].comments.is_empty());
    }

    #[test]
    fn trailing_comment_becomes_case_note() {
        let cases = parse_scenario("## c\n点击 A\n# done", &flow());
        assert_eq!(cases[0].comments, vec!["done".to_string()]);
        assert_eq!(cases[0].steps[0].comment, None);
    }

    #[test]
    fn crlf_and_indentation_are_trimmed() {
        let cases = parse_scenario("  ## c \r\n\t点击 A\r\n\r\n", &flow());
        assert_eq!(cases[0].name, "c");
        assert_eq!(cases[0].steps[0].action, "点击 A");
    }

    #[test]
    fn workflow_is_lowercased_stem() {
        let id = workflow_for_path(Path::new("scenarios/Login.txt")).unwrap();
        assert_eq!(id.as_str(), "login-flow");
        assert!(workflow_for_path(Path::new("")).is_err());
    }
}
