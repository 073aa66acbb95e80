//! Custom rule definitions loaded from YAML

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itest_core_types::ActionKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::PatternError;
use crate::model::{Pattern, PatternDef, PatternOrigin};

/// Shape of `step-patterns.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<PatternDef>>,
}

impl PatternConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, PatternError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads the config at `path`; a missing file yields `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, PatternError> {
        if !path.exists() {
            debug!(path = %path.display(), "no custom pattern config");
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            buckets = config.patterns.len(),
            "loaded custom step patterns"
        );
        Ok(Some(config))
    }

    /// Compiles every definition, preserving per-bucket file order.
    pub fn compile(&self) -> Result<Vec<Pattern>, PatternError> {
        let mut compiled = Vec::new();
        for (bucket, defs) in &self.patterns {
            let kind: ActionKind = bucket
                .parse()
                .map_err(|_| PatternError::UnknownKind(bucket.clone()))?;
            for def in defs {
                compiled.push(Pattern::compile(kind, def, PatternOrigin::Custom)?);
            }
        }
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.patterns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
