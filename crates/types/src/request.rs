//! Ready-to-send HTTP request descriptions.

use std::{fmt, str::FromStr};

use indexmap::{IndexMap, IndexSet};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP verbs the engine will issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct UnsupportedMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(UnsupportedMethodError(s.to_string())),
        }
    }
}

/// A fully synthesized request: absolute URL, headers and optional JSON body.
///
/// The engine builds these but never sends them itself; an HTTP client
/// collaborator does. Header and query names that carry a credential are
/// listed in `sensitive` so that anything displaying the request can hide
/// their values. `Debug` output hides them too.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpRequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Header and query parameter names whose values are secret.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub sensitive: IndexSet<String>,
}

impl HttpRequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
            sensitive: IndexSet::new(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Records that the header or query parameter `name` carries a secret.
    pub fn mark_sensitive(&mut self, name: impl Into<String>) {
        self.sensitive.insert(name.into());
    }

    /// Case-insensitive check against the names recorded by [`Self::mark_sensitive`].
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive.iter().any(|marked| marked.eq_ignore_ascii_case(name))
    }

    /// The URL with the values of sensitive query parameters replaced by `<redacted>`.
    pub fn redacted_url(&self) -> String {
        let Some((base, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };
        let pairs: Vec<String> = query
            .split('&')
            .map(|pair| {
                let name = pair.split_once('=').map_or(pair, |(name, _)| name);
                let decoded = percent_decode_str(name).decode_utf8_lossy();
                if self.is_sensitive(&decoded) {
                    format!("{name}=<redacted>")
                } else {
                    pair.to_string()
                }
            })
            .collect();
        format!("{base}?{}", pairs.join("&"))
    }

    /// Headers with the values of sensitive names replaced by `<redacted>`.
    pub fn redacted_headers(&self) -> IndexMap<String, String> {
        self.headers
            .iter()
            .map(|(name, value)| {
                let shown = if self.is_sensitive(name) { "<redacted>".to_string() } else { value.clone() };
                (name.clone(), shown)
            })
            .collect()
    }
}

impl fmt::Debug for HttpRequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("headers", &self.redacted_headers())
            .field("body", &self.body)
            .field("sensitive", &self.sensitive)
            .finish()
    }
}
