//! `${name}` template rendering

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static TEMPLATE_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([\w:]+)\}").expect("template placeholder regex"));

/// Substitutes `${name}` from `values`; unknown names stay as written.
///
/// Substituted values are escaped for use inside double-quoted script arguments.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &regex::Captures<'_>| match values.get(&caps[1]) {
            Some(value) => escape(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_known_placeholders() {
        let code = render_template(
            r#"expect_text "${element}" "${expected}""#,
            &values(&[("element", "标题"), ("expected", "欢迎")]),
        );
        assert_eq!(code, r#"expect_text "标题" "欢迎""#);
    }

    #[test]
    fn unknown_placeholders_stay_literal() {
        let code = render_template("wait_for \"${element}\" ${ms:timeout}", &values(&[]));
        assert_eq!(code, "wait_for \"${element}\" ${ms:timeout}");
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let code = render_template(r#"act "${v}""#, &values(&[("v", r#"say "hi""#)]));
        assert_eq!(code, r#"act "say \"hi\"""#);
    }
}
