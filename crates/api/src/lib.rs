//! HTTP client used to send synthesized requests.
//!
//! [`ApiClient`] wraps a configured `reqwest::Client` and owns the transient
//! failure policy: responses with status 429 or 503 are retried with
//! exponential backoff, every other non-success status fails immediately with
//! the status code and raw body. The plan engine never retries on its own, so
//! whatever happens here is invisible to it.
//!
//! # Example
//!
//! ```ignore
//! use apiplan_api::{ApiClient, ClientConfig};
//! use apiplan_types::{HttpMethod, HttpRequestDescriptor};
//!
//! let client = ApiClient::new(ClientConfig::default())?;
//! let request = HttpRequestDescriptor::new(HttpMethod::Get, "https://api.example.com/items");
//! let payload = client.send_blocking(request)?;
//! ```

use std::time::{Duration, Instant};

use apiplan_types::{HttpMethod, HttpRequestDescriptor};
use apiplan_util::{JsonParseError, block_on_future, parse_response_body, redact_sensitive, truncate_response_preview};
use reqwest::{
    Client, Method, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to obtain a successful JSON response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status (after any retries).
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered 2xx but the body was not JSON.
    #[error(transparent)]
    InvalidJson(#[from] JsonParseError),
    /// The descriptor could not be turned into a request (bad header name or value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The blocking bridge failed to run the request.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl TransportError {
    /// HTTP status carried by the error, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Exponential backoff applied to 429 and 503 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that sends exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable(status: StatusCode) -> bool {
        matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE)
    }

    /// Delay before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Construction settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    user_agent: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            user_agent: format!("apiplan/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
            retry: config.retry,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends the request, retrying transient statuses, and parses the JSON response.
    pub async fn send(&self, request: &HttpRequestDescriptor) -> Result<Value, TransportError> {
        let start = Instant::now();
        let logged_url = redact_sensitive(&request.redacted_url());
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(method = %request.method, url = %logged_url, attempt, "http request started");
            let response = self
                .build_request(request)?
                .send()
                .await
                .map_err(|error| TransportError::Network(redact_sensitive(&error.without_url().to_string())))?;
            let status = response.status();

            if RetryPolicy::is_retryable(status) && attempt < max_attempts {
                let delay = self.retry.backoff_after(attempt);
                warn!(
                    method = %request.method,
                    url = %logged_url,
                    status = %status,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "transient HTTP status; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|error| TransportError::Network(error.without_url().to_string()))?;

            if !status.is_success() {
                warn!(
                    method = %request.method,
                    url = %logged_url,
                    status = %status,
                    attempt,
                    body_preview = %truncate_response_preview(&body, 200),
                    duration_ms = start.elapsed().as_millis(),
                    "http request failed"
                );
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let payload = parse_response_body(&body, Some(status))?;
            debug!(
                method = %request.method,
                url = %logged_url,
                status = %status,
                attempt,
                duration_ms = start.elapsed().as_millis(),
                "http request completed"
            );
            return Ok(payload);
        }
    }

    /// Blocking wrapper around [`ApiClient::send`] for the synchronous engine.
    pub fn send_blocking(&self, request: HttpRequestDescriptor) -> Result<Value, TransportError> {
        let client = self.clone();
        let outcome = block_on_future(async move { Ok(client.send(&request).await) });
        match outcome {
            Ok(result) => result,
            Err(error) => Err(TransportError::Runtime(error.to_string())),
        }
    }

    fn build_request(&self, request: &HttpRequestDescriptor) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|error| TransportError::InvalidRequest(format!("header name '{name}': {error}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|error| TransportError::InvalidRequest(format!("header '{name}' value: {error}")))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), &request.url)
            .header(header::USER_AGENT, &self.user_agent)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}
