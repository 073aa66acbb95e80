//! Merged, priority-ordered rule table

use std::cmp::Reverse;
use std::collections::BTreeMap;

use itest_core_types::ActionKind;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builtin::builtin_patterns;
use crate::config::PatternConfig;
use crate::errors::PatternError;
use crate::model::{Pattern, PatternOrigin};

/// Registry summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStats {
    pub total: usize,
    pub per_kind: BTreeMap<ActionKind, usize>,
    pub builtin: usize,
    pub custom: usize,
}

/// Immutable rule table; one bucket per action kind, scanned in [`ActionKind::ALL`] order.
#[derive(Clone, Debug)]
pub struct PatternRegistry {
    buckets: Vec<(ActionKind, Vec<Pattern>)>,
}

impl PatternRegistry {
    /// Pure merge: builtin then custom per bucket, stable-sorted by descending priority.
    ///
    /// Equal priorities keep post-concatenation order, so builtins win ties.
    pub fn merge(builtin: Vec<Pattern>, custom: Vec<Pattern>) -> Self {
        let mut buckets: Vec<(ActionKind, Vec<Pattern>)> =
            ActionKind::ALL.iter().map(|kind| (*kind, Vec::new())).collect();

        for pattern in builtin.into_iter().chain(custom) {
            if let Some((_, bucket)) = buckets.iter_mut().find(|(kind, _)| *kind == pattern.kind) {
                bucket.push(pattern);
            }
        }
        for (_, bucket) in buckets.iter_mut() {
            bucket.sort_by_key(|pattern| Reverse(pattern.priority));
        }

        Self { buckets }
    }

    pub fn builtin_only() -> Self {
        Self::merge(builtin_patterns(), Vec::new())
    }

    /// Builtins plus the compiled custom config, if any.
    pub fn with_custom(custom: Option<&PatternConfig>) -> Result<Self, PatternError> {
        let custom = match custom {
            Some(config) => config.compile()?,
            None => Vec::new(),
        };
        let registry = Self::merge(builtin_patterns(), custom);
        let stats = registry.stats();
        info!(
            total = stats.total,
            builtin = stats.builtin,
            custom = stats.custom,
            "step pattern registry ready"
        );
        Ok(registry)
    }

    pub fn patterns_for(&self, kind: ActionKind) -> &[Pattern] {
        self.buckets
            .iter()
            .find(|(bucket, _)| *bucket == kind)
            .map(|(_, patterns)| patterns.as_slice())
            .unwrap_or(&[])
    }

    pub fn buckets(&self) -> impl Iterator<Item = (ActionKind, &[Pattern])> {
        self.buckets
            .iter()
            .map(|(kind, patterns)| (*kind, patterns.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.buckets.iter().flat_map(|(_, patterns)| patterns.iter())
    }

    pub fn find(&self, name: &str) -> Option<&Pattern> {
        self.iter().find(|pattern| pattern.name == name)
    }

    pub fn stats(&self) -> PatternStats {
        let mut stats = PatternStats::default();
        for (kind, patterns) in &self.buckets {
            if patterns.is_empty() {
                continue;
            }
            stats.per_kind.insert(*kind, patterns.len());
            stats.total += patterns.len();
            for pattern in patterns {
                match pattern.origin {
                    PatternOrigin::Builtin => stats.builtin += 1,
                    PatternOrigin::Custom => stats.custom += 1,
                }
            }
        }
        stats
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin_only()
    }
}
