//! First-match translation over the rule table

use std::collections::BTreeMap;
use std::sync::Arc;

use itest_core_types::{ActionKind, TranslationEngine};
use step_patterns::{Pattern, PatternRegistry};
use tracing::debug;

use crate::descriptor::ActionDescriptor;
use crate::sanitize::sanitize_url;
use crate::template::render_template;
use crate::variables::{resolve_placeholders, VariableTable};

/// Stateless translator; cheap to clone and share across cases.
#[derive(Clone, Debug)]
pub struct Translator {
    registry: Arc<PatternRegistry>,
}

impl Translator {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Never fails: unmatched or blank input degrades to the fallback descriptor.
    pub fn translate(&self, text: &str, vars: &VariableTable) -> ActionDescriptor {
        let original = text.trim();
        let resolved = resolve_placeholders(original, vars);

        let matched = self
            .registry
            .buckets()
            .flat_map(|(_, patterns)| patterns.iter())
            .find_map(|pattern| pattern.captures(&resolved.text).map(|m| (pattern, m)));

        let Some((pattern, matched)) = matched else {
            debug!(step = original, "no rule matched, using fallback");
            return ActionDescriptor::fallback(original, resolved.text, resolved.captured);
        };

        let params: BTreeMap<String, String> = matched
            .groups
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value?.trim().to_string();
                (!value.is_empty()).then_some((name, value))
            })
            .collect();

        let descriptor = build(pattern, original, resolved.text, params, resolved.captured);
        debug!(
            step = original,
            rule = %pattern.name,
            kind = %descriptor.kind,
            engine = %descriptor.engine,
            "step translated"
        );
        descriptor
    }

    /// Whether `text` matches the rule called `name`.
    pub fn matches_pattern(&self, text: &str, name: &str) -> bool {
        self.registry
            .find(name)
            .is_some_and(|pattern| pattern.is_match(text.trim()))
    }
}

fn build(
    pattern: &Pattern,
    original: &str,
    resolved_text: String,
    mut params: BTreeMap<String, String>,
    captured: BTreeMap<String, String>,
) -> ActionDescriptor {
    if pattern.kind == ActionKind::Goto {
        if let Some(url) = params.get_mut("url") {
            *url = sanitize_url(url);
        }
    }

    let generated_code = match (&pattern.template, pattern.engine) {
        (Some(template), TranslationEngine::Rules) => {
            let mut values = params.clone();
            values
                .entry("text".to_string())
                .or_insert_with(|| resolved_text.clone());
            values
                .entry("original".to_string())
                .or_insert_with(|| original.to_string());
            Some(render_template(template, &values))
        }
        _ => None,
    };

    ActionDescriptor {
        kind: pattern.kind,
        original_text: original.to_string(),
        resolved_text,
        params,
        captured_variables: captured,
        matched_pattern_name: Some(pattern.name.clone()),
        matched_pattern_description: Some(pattern.description.clone())
            .filter(|description| !description.is_empty()),
        matched_pattern: Some(pattern.source().to_string()),
        is_builtin: pattern.is_builtin(),
        engine: pattern.engine,
        generated_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use step_patterns::{PatternConfig, PatternDef, PatternOrigin};

    fn translator() -> Translator {
        Translator::new(Arc::new(PatternRegistry::builtin_only()))
    }

    #[test]
    fn click_rule_captures_element() {
        let d = translator().translate("点击登录按钮", &VariableTable::new());
        assert_eq!(d.kind, ActionKind::Act);
        assert_eq!(d.matched_pattern_name.as_deref(), Some("click_element"));
        assert_eq!(d.param("element"), Some("登录按钮"));
        assert!(d.is_builtin);
        assert_eq!(d.engine, TranslationEngine::Direct);
        assert!(d.generated_code.is_none());
    }

    #[test]
    fn goto_url_is_sanitized() {
        let d = translator().translate("打开登录页面 https://x.test", &VariableTable::new());
        assert_eq!(d.kind, ActionKind::Goto);
        assert_eq!(d.param("url"), Some("https://x.test"));
        assert_eq!(d.param("action"), Some("打开"));
        assert!(validate(&d));
    }

    #[test]
    fn unmatched_text_falls_back_to_raw_act() {
        let vars = VariableTable::new().with("WHO", "bob");
        let d = translator().translate("随便做点什么 %WHO%", &vars);
        assert!(d.is_fallback());
        assert_eq!(d.kind, ActionKind::Act);
        assert_eq!(d.params.get("raw").map(String::as_str), Some("随便做点什么 bob"));
        assert!(d.is_builtin);
        assert!(validate(&d));
    }

    #[test]
    fn blank_input_is_an_invalid_fallback() {
        let d = translator().translate("   ", &VariableTable::new());
        assert!(d.is_fallback());
        assert!(!validate(&d));
    }

    #[test]
    fn unmatched_optional_group_is_omitted() {
        let d = translator().translate("提取 商品价格", &VariableTable::new());
        assert_eq!(d.kind, ActionKind::Extract);
        assert_eq!(d.param("target"), Some("商品价格"));
        assert!(!d.params.contains_key("variable"));
    }

    #[test]
    fn rules_template_is_rendered_from_params() {
        let d = translator().translate("检查 标题 是否包含 欢迎", &VariableTable::new());
        assert_eq!(d.engine, TranslationEngine::Rules);
        assert_eq!(
            d.generated_code.as_deref(),
            Some(r#"expect_text "标题" "欢迎""#)
        );
    }

    #[test]
    fn refresh_is_valid_without_url() {
        let d = translator().translate("刷新页面", &VariableTable::new());
        assert_eq!(d.kind, ActionKind::Goto);
        assert!(validate(&d));
    }

    #[test]
    fn highest_priority_custom_rule_wins() {
        let config = PatternConfig::from_yaml_str(
            "patterns:\n  act:\n    - name: vip_click\n      pattern: \"^点击\\\\s*(VIP.*)$\"\n      groups: [element]\n      priority: 150\n",
        )
        .unwrap();
        let registry = PatternRegistry::with_custom(Some(&config)).unwrap();
        let t = Translator::new(Arc::new(registry));
        let d = t.translate("点击VIP入口", &VariableTable::new());
        assert_eq!(d.matched_pattern_name.as_deref(), Some("vip_click"));
        assert!(!d.is_builtin);
        let other = t.translate("点击 普通入口", &VariableTable::new());
        assert_eq!(other.matched_pattern_name.as_deref(), Some("click_element"));
    }

    #[test]
    fn equal_priority_tie_goes_to_builtin() {
        let custom = Pattern::compile(
            ActionKind::Act,
            &PatternDef::new("click_clone", r"^点击\s*(.+)$", &["element"], 100, ""),
            PatternOrigin::Custom,
        )
        .unwrap();
        let registry = PatternRegistry::merge(step_patterns::builtin_patterns(), vec![custom]);
        let d = Translator::new(Arc::new(registry)).translate("点击 A", &VariableTable::new());
        assert_eq!(d.matched_pattern_name.as_deref(), Some("click_element"));
    }

    #[test]
    fn matches_pattern_by_name() {
        let t = translator();
        assert!(t.matches_pattern("点击 A", "click_element"));
        assert!(!t.matches_pattern("点击 A", "go_back"));
        assert!(!t.matches_pattern("点击 A", "no_such_rule"));
    }
}
