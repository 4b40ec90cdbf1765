pub mod async_runtime;
pub mod http;
pub mod keystore;
pub mod path_processing;

pub use async_runtime::block_on_future;
pub use http::*;
pub use path_processing::expand_tilde;

use once_cell::sync::Lazy;
use regex::Regex;

static REDACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+ ]+)",
        r"(?i)(x-api-key: )([^\s]+)",
        r"(?i)([A-Z0-9_\-]*?(KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("redaction pattern compiles"))
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Covers `Authorization:`/`X-API-KEY:` header lines and `*KEY=`, `*TOKEN=`,
/// `*SECRET=`, `*PASSWORD=` assignments, including query string pairs.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACTION_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
