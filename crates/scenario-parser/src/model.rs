use itest_core_types::WorkflowId;
use serde::{Deserialize, Serialize};

/// One step as written by the author; immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub workflow: WorkflowId,
}

impl StepInfo {
    pub fn new(action: impl Into<String>, workflow: WorkflowId) -> Self {
        Self {
            action: action.into(),
            comment: None,
            workflow,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub steps: Vec<StepInfo>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            steps: Vec::new(),
        }
    }
}
