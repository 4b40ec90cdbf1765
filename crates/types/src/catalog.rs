//! Normalized, read-only description of a learned REST API.
//!
//! A [`Catalog`] is produced by an external importer from an OpenAPI or
//! Postman document and handed to the engine as-is. The engine never mutates
//! it during a run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::SchemaNode;

/// One alternative combination of security schemes: scheme name to required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Where a declared operation parameter is carried on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

/// A parameter declared by an operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    /// Raw schema from the source document; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// A single callable API operation (one method on one path).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    /// HTTP verb as written in the source document; validated at synthesis time.
    pub http_method: String,
    /// Path template, possibly containing `{name}` placeholders.
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub request_body_schema: Option<SchemaNode>,
    /// Alternative security requirement sets, in declaration order.
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    /// Iterates the declared parameters carried in `location`.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |parameter| parameter.location == location)
    }
}

/// Where an API key credential is placed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// Authentication mechanism of a named security scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SecuritySchemeKind {
    #[serde(rename_all = "camelCase")]
    ApiKey { location: ApiKeyLocation, parameter_name: String },
    /// `Authorization: Bearer <credential>`.
    HttpBearer,
    /// Any scheme the engine does not know how to apply (oauth2, openIdConnect, basic, ...).
    Other {
        #[serde(default)]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityScheme {
    pub name: String,
    #[serde(flatten)]
    pub kind: SecuritySchemeKind,
}

/// The full, immutable description of one API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Base server URLs; the first one is primary.
    #[serde(default)]
    pub server_urls: Vec<String>,
    #[serde(default)]
    pub operations: IndexMap<String, Operation>,
    #[serde(default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

impl Catalog {
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operations.get(operation_id)
    }

    pub fn primary_server_url(&self) -> Option<&str> {
        self.server_urls.first().map(String::as_str)
    }

    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.get(name)
    }

    /// Parses a catalog from its JSON document form.
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
