//! Query string construction.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Everything except RFC3986 unreserved bytes is percent-encoded.
pub(crate) const UNRESERVED_ONLY: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Expands one parameter into `(name, value)` pairs.
///
/// Arrays repeat the key once per item; `null` becomes an empty value.
pub fn query_pairs_for(name: &str, value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Array(items) => items.iter().map(|item| (name.to_string(), query_value_to_string(item))).collect(),
        other => vec![(name.to_string(), query_value_to_string(other))],
    }
}

fn query_value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Percent-encodes and joins pairs into `a=1&b=2` form.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, UNRESERVED_ONLY),
                utf8_percent_encode(value, UNRESERVED_ONLY)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends an encoded query string to a URL, respecting an existing `?`.
pub fn append_query(url: &str, encoded_query: &str) -> String {
    if encoded_query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{encoded_query}")
}
