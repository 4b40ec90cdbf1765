//! Response body parsing and status diagnostics.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Operator-facing hint for authentication failures.
///
/// Requests proceed unauthenticated when no credential is stored for an
/// alias, so 401/403 usually means the credential is missing or stale.
///
/// # Example
/// ```rust
/// use apiplan_util::http::status_error_message;
///
/// assert!(status_error_message(401).unwrap().contains("Unauthorized"));
/// assert!(status_error_message(403).unwrap().contains("Forbidden"));
/// assert!(status_error_message(404).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: store a credential for this API alias".into()),
        403 => Some("Forbidden (403). Hint: check the credential's permissions and scopes".into()),
        _ => None,
    }
}

/// Parses a successful response body: blank bodies become `null`, anything
/// else must be JSON.
pub fn parse_response_body(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    parse_response_json_strict(text, status)
}

/// Parse HTTP response text into JSON, decorating failures with the status
/// and a truncated preview of the body.
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        JsonParseError::new(status_note, error, truncate_response_preview(text, 200))
    })
}

/// Collapses whitespace and truncates a body to `limit` bytes for diagnostics.
pub fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
