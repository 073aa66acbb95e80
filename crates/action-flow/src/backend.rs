//! Collaborator interfaces for the automation backend and its session provider

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use itest_core_types::WorkflowId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BackendError, SessionError};

/// Time budget for the generic act path.
pub const ACT_TIMEOUT_MS: u64 = 30_000;
/// Attempts delegated to the backend for the generic act path.
pub const ACT_RETRIES: u32 = 2;
/// Step ceiling for agent tasks.
pub const DEFAULT_AGENT_MAX_STEPS: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActOptions {
    pub timeout_ms: u64,
    pub retries: u32,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl ActOptions {
    pub fn generic(variables: BTreeMap<String, String>) -> Self {
        Self {
            timeout_ms: ACT_TIMEOUT_MS,
            retries: ACT_RETRIES,
            variables,
        }
    }
}

/// Extraction shape chosen from the wording of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeHint {
    List,
    Text,
    Links,
    Auto,
}

impl ShapeHint {
    const LIST_WORDS: &'static [&'static str] = &["列表", "表格", "所有", "list", "table", "all"];
    const TEXT_WORDS: &'static [&'static str] = &["文本", "内容", "信息", "text", "content", "info"];
    const LINK_WORDS: &'static [&'static str] = &["链接", "网址", "link", "url"];

    pub fn classify(target: &str) -> Self {
        let lowered = target.to_lowercase();
        let ascii_words: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        // ASCII keywords match whole words only; CJK keywords match anywhere
        let has = |keywords: &[&str]| {
            keywords.iter().any(|keyword| {
                if keyword.is_ascii() {
                    ascii_words.contains(keyword)
                } else {
                    lowered.contains(keyword)
                }
            })
        };
        if has(Self::LIST_WORDS) {
            ShapeHint::List
        } else if has(Self::TEXT_WORDS) {
            ShapeHint::Text
        } else if has(Self::LINK_WORDS) {
            ShapeHint::Links
        } else {
            ShapeHint::Auto
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeHint::List => "list",
            ShapeHint::Text => "text",
            ShapeHint::Links => "links",
            ShapeHint::Auto => "auto",
        }
    }
}

impl fmt::Display for ShapeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedElement {
    pub description: String,
    pub selector: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTaskRequest {
    pub instruction: String,
    pub max_steps: u32,
    pub accept_user_feedback: bool,
}

impl AgentTaskRequest {
    pub fn new(instruction: impl Into<String>, max_steps: u32) -> Self {
        Self {
            instruction: instruction.into(),
            max_steps,
            accept_user_feedback: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTaskResult {
    #[serde(default)]
    pub steps: Vec<Value>,
    #[serde(default)]
    pub result: Value,
    /// Non-fatal error reported by a task that still ran to an end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed: bool,
}

/// Stateful automation handle bound to one workflow.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BackendError>;
    async fn go_back(&self) -> Result<(), BackendError>;
    async fn reload(&self) -> Result<(), BackendError>;
    async fn title(&self) -> Result<String, BackendError>;
    async fn act(&self, instruction: &str, options: &ActOptions) -> Result<Value, BackendError>;
    async fn extract(&self, target: &str, shape: ShapeHint) -> Result<Value, BackendError>;
    async fn observe(&self, target: &str) -> Result<Vec<ObservedElement>, BackendError>;
    async fn run_agent_task(
        &self,
        request: &AgentTaskRequest,
    ) -> Result<AgentTaskResult, BackendError>;
}

/// Hands out sessions keyed by workflow; may cache and reuse them.
///
/// Cases sharing a workflow share the session; serializing access is the
/// provider's job.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(
        &self,
        workflow: &WorkflowId,
    ) -> Result<Arc<dyn AutomationSession>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_hint_follows_keywords() {
        assert_eq!(ShapeHint::classify("商品列表"), ShapeHint::List);
        assert_eq!(ShapeHint::classify("All prices"), ShapeHint::List);
        assert_eq!(ShapeHint::classify("页面文本"), ShapeHint::Text);
        assert_eq!(ShapeHint::classify("下载链接"), ShapeHint::Links);
        assert_eq!(ShapeHint::classify("价格"), ShapeHint::Auto);
    }

    #[test]
    fn ascii_keywords_need_whole_words() {
        assert_eq!(ShapeHint::classify("install button"), ShapeHint::Auto);
        assert_eq!(ShapeHint::classify("stable version"), ShapeHint::Auto);
        assert_eq!(ShapeHint::classify("curl example"), ShapeHint::Auto);
        assert_eq!(ShapeHint::classify("Download URL"), ShapeHint::Links);
        assert_eq!(ShapeHint::classify("订单list"), ShapeHint::List);
        assert_eq!(ShapeHint::classify("product-info"), ShapeHint::Text);
    }

    #[test]
    fn generic_act_options_are_fixed() {
        let options = ActOptions::generic(BTreeMap::new());
        assert_eq!(options.timeout_ms, 30_000);
        assert_eq!(options.retries, 2);
    }
}
