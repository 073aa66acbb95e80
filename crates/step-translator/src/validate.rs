//! Kind-specific descriptor checks and navigation intent

use itest_core_types::ActionKind;

use crate::descriptor::ActionDescriptor;
use crate::errors::TranslateError;

const REFRESH_WORDS: &[&str] = &["刷新", "重新加载", "refresh", "reload"];
const BACK_WORDS: &[&str] = &["返回", "后退", "back", "go back"];

/// What a `goto` descriptor asks the session to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationIntent {
    Refresh,
    Back,
    /// Explicit URL parameter, possibly still invalid.
    Url(String),
    /// No URL given; the dispatcher falls back to variables and defaults.
    Unspecified,
}

pub fn navigation_intent(descriptor: &ActionDescriptor) -> NavigationIntent {
    if let Some(action) = descriptor.param("action") {
        let action = action.trim().to_lowercase();
        if REFRESH_WORDS.contains(&action.as_str()) {
            return NavigationIntent::Refresh;
        }
        if BACK_WORDS.contains(&action.as_str()) {
            return NavigationIntent::Back;
        }
    }
    match descriptor.param("url") {
        Some(url) => NavigationIntent::Url(url.trim().to_string()),
        None => NavigationIntent::Unspecified,
    }
}

/// Boolean form of [`check`].
pub fn validate(descriptor: &ActionDescriptor) -> bool {
    check(descriptor).is_ok()
}

pub fn check(descriptor: &ActionDescriptor) -> Result<(), TranslateError> {
    let kind = descriptor.kind;
    match kind {
        ActionKind::Goto => match navigation_intent(descriptor) {
            NavigationIntent::Unspecified => Err(TranslateError::invalid(
                kind,
                "missing url or refresh/back action",
            )),
            _ => Ok(()),
        },
        ActionKind::Extract | ActionKind::Observe => require(descriptor, "target"),
        ActionKind::Agent => require(descriptor, "instruction"),
        ActionKind::Act => {
            let has_text = descriptor.param("raw").is_some()
                || (!descriptor.is_fallback() && !descriptor.resolved_text.trim().is_empty());
            if has_text {
                Ok(())
            } else {
                Err(TranslateError::invalid(kind, "empty action text"))
            }
        }
        ActionKind::Template => match descriptor.generated_code.as_deref() {
            Some(code) if !code.trim().is_empty() => Ok(()),
            _ => Err(TranslateError::invalid(kind, "no generated code")),
        },
    }
}

fn require(descriptor: &ActionDescriptor, param: &str) -> Result<(), TranslateError> {
    descriptor
        .param(param)
        .map(|_| ())
        .ok_or_else(|| TranslateError::invalid(descriptor.kind, format!("missing {param}")))
}
