use itest_core_types::ActionKind;

use crate::descriptor::ActionDescriptor;
use crate::validate::{navigation_intent, NavigationIntent};

/// One-line human summary of what a descriptor will do.
pub fn describe(descriptor: &ActionDescriptor) -> String {
    let param = |name: &str| descriptor.param(name).unwrap_or("?").to_string();
    match descriptor.kind {
        ActionKind::Goto => match navigation_intent(descriptor) {
            NavigationIntent::Refresh => "refresh the current page".to_string(),
            NavigationIntent::Back => "go back to the previous page".to_string(),
            NavigationIntent::Url(url) => format!("navigate to {url}"),
            NavigationIntent::Unspecified => "navigate to the default base url".to_string(),
        },
        ActionKind::Extract => match descriptor.param("variable") {
            Some(var) => format!("extract {} into ${var}", param("target")),
            None => format!("extract {}", param("target")),
        },
        ActionKind::Observe => format!("observe {}", param("target")),
        ActionKind::Agent => format!("agent task: {}", param("instruction")),
        ActionKind::Act | ActionKind::Template => match descriptor.generated_code.as_deref() {
            Some(code) => format!("run script [{}]: {code}", descriptor.rule_name()),
            None => format!(
                "act: {}",
                descriptor
                    .param("raw")
                    .unwrap_or(descriptor.resolved_text.as_str())
            ),
        },
    }
}
