//! Step translation engine.
//!
//! Turns one line of scenario text into an [`ActionDescriptor`]: resolves `%NAME%`
//! placeholders, scans the rule table first-match, sanitizes navigation URLs and
//! renders script templates. Translation never fails; [`validate`] decides whether
//! the result is dispatchable.

pub mod describe;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod sanitize;
pub mod template;
pub mod validate;
pub mod variables;

pub use describe::describe;
pub use descriptor::{ActionDescriptor, FALLBACK_PATTERN};
pub use engine::Translator;
pub use errors::TranslateError;
pub use sanitize::{is_http_url, sanitize_url};
pub use template::render_template;
pub use validate::{check, navigation_intent, validate, NavigationIntent};
pub use variables::{resolve_placeholders, ResolvedText, VariableTable};
