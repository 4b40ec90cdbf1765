//! The HTTP seam of the executor.

use apiplan_api::{ApiClient, TransportError};
use apiplan_types::HttpRequestDescriptor;
use apiplan_util::redact_sensitive;
use serde_json::{Map, Value, json};

/// Sends one synthesized request and returns its JSON response.
///
/// Retry and backoff, if any, belong to the implementation; the executor
/// calls `send` exactly once per step.
pub trait HttpSender: Send + Sync {
    fn send(&self, request: HttpRequestDescriptor) -> Result<Value, TransportError>;
}

impl HttpSender for ApiClient {
    fn send(&self, request: HttpRequestDescriptor) -> Result<Value, TransportError> {
        self.send_blocking(request)
    }
}

/// Sender that performs no network I/O.
///
/// Each request is answered with an echo of itself (`method`, `url`,
/// `headers`, `body`) with credential-bearing values redacted, which lets a
/// plan be rehearsed end to end. Derived parameters that point into real
/// response fields will fail to extract against the echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSender;

impl HttpSender for DryRunSender {
    fn send(&self, request: HttpRequestDescriptor) -> Result<Value, TransportError> {
        let headers: Map<String, Value> = request
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if request.is_sensitive(name) || is_sensitive_header(name) {
                    "<redacted>".to_string()
                } else {
                    value.clone()
                };
                (name.clone(), Value::String(shown))
            })
            .collect();

        Ok(json!({
            "dryRun": true,
            "method": request.method.as_str(),
            "url": redact_sensitive(&request.redacted_url()),
            "headers": headers,
            "body": request.body.unwrap_or(Value::Null),
        }))
    }
}

fn is_sensitive_header(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    ["authorization", "cookie", "key", "token", "secret", "password"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiplan_types::HttpMethod;

    #[test]
    fn dry_run_echoes_request_with_secrets_redacted() {
        let mut request = HttpRequestDescriptor::new(HttpMethod::Post, "https://api.example.com/items?api_key=abc&status=new");
        request.headers.insert("X-API-KEY".into(), "my-secret-key".into());
        request.headers.insert("Authorization".into(), "Bearer tok".into());
        request.headers.insert("X-Request-Id".into(), "req-1".into());
        request.body = Some(json!({"name": "widget"}));

        let echo = DryRunSender.send(request).unwrap();
        assert_eq!(echo["dryRun"], json!(true));
        assert_eq!(echo["method"], json!("POST"));
        assert_eq!(echo["url"], json!("https://api.example.com/items?api_key=<redacted>&status=new"));
        assert_eq!(echo["headers"]["X-API-KEY"], json!("<redacted>"));
        assert_eq!(echo["headers"]["Authorization"], json!("<redacted>"));
        assert_eq!(echo["headers"]["X-Request-Id"], json!("req-1"));
        assert_eq!(echo["body"], json!({"name": "widget"}));
    }

    #[test]
    fn dry_run_hides_values_marked_sensitive_under_any_name() {
        let mut request = HttpRequestDescriptor::new(HttpMethod::Get, "https://api.example.com/items?status=new&access=s3cr3t-value");
        request.headers.insert("X-Client-Auth".into(), "s3cr3t-value".into());
        request.mark_sensitive("X-Client-Auth");
        request.mark_sensitive("access");

        let echo = DryRunSender.send(request).unwrap();
        assert_eq!(echo["url"], json!("https://api.example.com/items?status=new&access=<redacted>"));
        assert_eq!(echo["headers"]["X-Client-Auth"], json!("<redacted>"));
        assert!(!echo.to_string().contains("s3cr3t-value"));
    }
}
