//! Variable table backing `%NAME%` placeholder resolution

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Za-z0-9_]+)%").expect("placeholder regex"));

/// Immutable name→value table, built once per run and passed explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: BTreeMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later layers override earlier ones.
    pub fn layered<I, J, K, V>(layers: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for layer in layers {
            for (key, value) in layer {
                table.values.insert(key.into(), value.into());
            }
        }
        table
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of substituting placeholders into a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    /// Every placeholder name seen, mapped to its value or the literal `%NAME%`.
    pub captured: BTreeMap<String, String>,
}

impl ResolvedText {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.captured
            .iter()
            .filter(|(name, value)| **value == format!("%{name}%"))
            .map(|(name, _)| name.as_str())
    }
}

/// Substitutes resolvable placeholders; unresolved ones stay verbatim.
pub fn resolve_placeholders(text: &str, vars: &VariableTable) -> ResolvedText {
    let mut captured = BTreeMap::new();
    let resolved = PLACEHOLDER.replace_all(text, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        let value = vars
            .get(name)
            .map(str::to_string)
            .unwrap_or_else(|| caps[0].to_string());
        captured.insert(name.to_string(), value.clone());
        value
    });
    ResolvedText {
        text: resolved.into_owned(),
        captured,
    }
}
