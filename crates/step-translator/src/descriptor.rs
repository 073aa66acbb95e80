use std::collections::BTreeMap;

use itest_core_types::{ActionKind, TranslationEngine};
use serde::{Deserialize, Serialize};

/// Name reported for descriptors produced by the fallback path.
pub const FALLBACK_PATTERN: &str = "default_fallback";

/// Typed translation of one step, ready for dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub original_text: String,
    pub resolved_text: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub captured_variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern_description: Option<String>,
    /// Anchored matcher source of the rule that fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    pub is_builtin: bool,
    pub engine: TranslationEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
}

impl ActionDescriptor {
    pub(crate) fn fallback(original_text: &str, resolved_text: String, captured: BTreeMap<String, String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert("raw".to_string(), resolved_text.clone());
        Self {
            kind: ActionKind::Act,
            original_text: original_text.to_string(),
            resolved_text,
            params,
            captured_variables: captured,
            matched_pattern_name: Some(FALLBACK_PATTERN.to_string()),
            matched_pattern_description: None,
            matched_pattern: None,
            is_builtin: true,
            engine: TranslationEngine::Direct,
            generated_code: None,
        }
    }

    /// Non-empty parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_fallback(&self) -> bool {
        self.matched_pattern_name.as_deref() == Some(FALLBACK_PATTERN)
    }

    pub fn rule_name(&self) -> &str {
        self.matched_pattern_name.as_deref().unwrap_or(FALLBACK_PATTERN)
    }

    /// Placeholder values that actually resolved, for backends that substitute themselves.
    pub fn resolved_variables(&self) -> BTreeMap<String, String> {
        self.captured_variables
            .iter()
            .filter(|(name, value)| **value != format!("%{name}%"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
