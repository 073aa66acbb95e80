//! URL recovery for navigation parameters

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static EMBEDDED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s'"`)]+"#).expect("embedded url regex"));

const WRAPPERS: &[char] = &['`', '\'', '"'];

/// Pulls the first well-formed `http(s)://` URL out of `value`.
///
/// Returns `value` unchanged when nothing valid can be recovered.
pub fn sanitize_url(value: &str) -> String {
    let stripped = value.trim().trim_matches(WRAPPERS).trim();
    EMBEDDED_URL
        .find(stripped)
        .map(|m| m.as_str())
        .filter(|candidate| Url::parse(candidate).is_ok_and(|url| url.host_str().is_some()))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// True when `value` parses as an absolute http(s) URL.
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
