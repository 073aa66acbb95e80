//! Step pattern registry.
//!
//! Holds the ordered rule table used by the translator: a fixed builtin set
//! merged with optional user rules loaded from YAML, bucketed per action kind
//! and sorted by descending priority.

pub mod builtin;
pub mod config;
pub mod errors;
pub mod model;
pub mod registry;

pub use builtin::{builtin_definitions, builtin_patterns, BUILTIN_TABLE_VERSION};
pub use config::PatternConfig;
pub use errors::PatternError;
pub use model::{Pattern, PatternDef, PatternMatch, PatternOrigin};
pub use registry::{PatternRegistry, PatternStats};
