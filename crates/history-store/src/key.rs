//! Storage keys for extracted artifacts

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fa5}]").expect("key charset regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("underscore regex"));

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `extracted_<normalized target>_<millis>_<seq>`.
///
/// The process-wide sequence keeps keys distinct when two extractions land in
/// the same millisecond.
pub fn generate_storage_key(target: &str) -> String {
    let clean = UNSAFE_CHARS.replace_all(target.trim(), "_");
    let clean = UNDERSCORE_RUNS.replace_all(&clean, "_").to_lowercase();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "extracted_{}_{}_{}",
        clean,
        Utc::now().timestamp_millis(),
        seq
    )
}
