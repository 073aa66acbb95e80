//! Rule definitions and their compiled form

use itest_core_types::{ActionKind, TranslationEngine};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::PatternError;

/// Where a rule came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternOrigin {
    Builtin,
    Custom,
}

/// Declarative rule as written in the builtin table or in a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub name: String,
    /// Regular expression source; anchored on compile when `^`/`$` are missing.
    pub pattern: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default)]
    pub description: String,
    /// Script template rendered with `${name}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<TranslationEngine>,
}

impl PatternDef {
    pub fn new(name: &str, pattern: &str, groups: &[&str], priority: i32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            priority: Some(priority),
            description: description.to_string(),
            template: None,
            engine: None,
        }
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn with_engine(mut self, engine: TranslationEngine) -> Self {
        self.engine = Some(engine);
        self
    }
}

/// Compiled rule ready for matching.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub name: String,
    pub kind: ActionKind,
    pub groups: Vec<String>,
    pub priority: i32,
    pub origin: PatternOrigin,
    pub description: String,
    pub template: Option<String>,
    pub engine: TranslationEngine,
    matcher: Regex,
}

/// Captures produced by a successful match, one slot per declared group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatch {
    pub groups: Vec<(String, Option<String>)>,
}

impl Pattern {
    pub fn compile(
        kind: ActionKind,
        def: &PatternDef,
        origin: PatternOrigin,
    ) -> Result<Self, PatternError> {
        if def.name.trim().is_empty() {
            return Err(PatternError::invalid_definition(
                def.pattern.clone(),
                "pattern name cannot be empty",
            ));
        }
        let matcher = Regex::new(&anchor(&def.pattern))
            .map_err(|err| PatternError::invalid_matcher(&def.name, err))?;

        // `rules` without a template dispatches as a generic act
        let engine = match def.engine {
            Some(engine) => engine,
            None if def.template.is_some() => TranslationEngine::Rules,
            None if kind == ActionKind::Agent => TranslationEngine::Agent,
            None => TranslationEngine::Direct,
        };

        if kind == ActionKind::Template && def.template.is_none() {
            return Err(PatternError::invalid_definition(
                &def.name,
                "template patterns must declare a template",
            ));
        }

        Ok(Self {
            name: def.name.clone(),
            kind,
            groups: def.groups.clone(),
            priority: def.priority.unwrap_or(0),
            origin,
            description: def.description.clone(),
            template: def.template.clone(),
            engine,
            matcher,
        })
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == PatternOrigin::Builtin
    }

    /// Matcher source after anchoring.
    pub fn source(&self) -> &str {
        self.matcher.as_str()
    }

    /// Match `text` and zip capture groups with the declared group names.
    pub fn captures(&self, text: &str) -> Option<PatternMatch> {
        let caps = self.matcher.captures(text)?;
        let groups = self
            .groups
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = caps.get(idx + 1).map(|m| m.as_str().to_string());
                (name.clone(), value)
            })
            .collect();
        Some(PatternMatch { groups })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

fn anchor(source: &str) -> String {
    let mut anchored = String::with_capacity(source.len() + 2);
    if !source.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(source);
    if !source.ends_with('$') {
        anchored.push('$');
    }
    anchored
}
