use std::fs;

use itest_core_types::ActionKind;
use step_patterns::{PatternConfig, PatternOrigin, PatternRegistry};

#[test]
fn missing_config_file_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = PatternConfig::load(&dir.path().join("step-patterns.yaml")).unwrap();
    assert!(loaded.is_none());

    let registry = PatternRegistry::with_custom(loaded.as_ref()).unwrap();
    assert_eq!(registry.stats().custom, 0);
    assert!(registry.stats().builtin > 0);
}

#[test]
fn custom_rule_with_higher_priority_is_scanned_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("step-patterns.yaml");
    fs::write(
        &path,
        r#"
patterns:
  act:
    - name: click_primary
      pattern: "^点击主按钮$"
      priority: 200
      description: "primary button"
    - name: click_anything
      pattern: "^点击\\s*(.+)$"
      groups: [element]
"#,
    )
    .unwrap();

    let config = PatternConfig::load(&path).unwrap();
    let registry = PatternRegistry::with_custom(config.as_ref()).unwrap();
    let act = registry.patterns_for(ActionKind::Act);

    assert_eq!(act[0].name, "click_primary");
    assert_eq!(act[0].origin, PatternOrigin::Custom);

    let builtin_click = act.iter().position(|p| p.name == "click_element").unwrap();
    let custom_click = act.iter().position(|p| p.name == "click_anything").unwrap();
    assert!(builtin_click < custom_click, "builtin outranks custom at equal or higher priority");

    let stats = registry.stats();
    assert_eq!(stats.custom, 2);
    assert_eq!(stats.total, stats.builtin + stats.custom);
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let err = PatternConfig::from_yaml_str("patterns: [unclosed").unwrap_err();
    assert!(err.to_string().contains("parse"));
}
