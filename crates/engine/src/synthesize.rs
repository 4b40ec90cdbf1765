//! Request synthesis: one catalog operation plus resolved parameter values
//! becomes an [`HttpRequestDescriptor`] ready for the HTTP client.
//!
//! Nothing here performs I/O. Only parameters the operation declares are
//! placed in the path, query string or headers; body fields are taken from the
//! top-level properties of the operation's object body schema.

use apiplan_types::{
    ApiKeyLocation, Catalog, Credential, HttpMethod, HttpRequestDescriptor, Operation, ParameterLocation, SchemaNode,
    SecuritySchemeKind, WHOLE_BODY_PARAMETER,
};
use apiplan_util::{append_query, build_path, encode_query, query_pairs_for, redact_sensitive, unresolved_placeholders, value_to_path_string};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::StepError;

/// Builds the request for `operation` from `resolved` parameter values.
///
/// `credential` is applied according to the operation's first security
/// requirement set only. Without a credential the request is built
/// unauthenticated.
///
/// # Errors
///
/// - [`StepError::UnsupportedMethod`] for a verb outside GET, POST, PUT, PATCH, DELETE.
/// - [`StepError::Configuration`] when the catalog lists no server URL.
pub fn build_request(
    operation: &Operation,
    resolved: &IndexMap<String, Value>,
    catalog: &Catalog,
    credential: Option<&Credential>,
) -> Result<HttpRequestDescriptor, StepError> {
    let method: HttpMethod = operation.http_method.parse()?;
    let base_url = catalog
        .primary_server_url()
        .ok_or_else(|| StepError::Configuration("catalog has no server URL".to_string()))?
        .trim_end_matches('/');

    let path_variables: Map<String, Value> = operation
        .parameters_in(ParameterLocation::Path)
        .filter_map(|parameter| resolved.get(&parameter.name).map(|value| (parameter.name.clone(), value.clone())))
        .collect();
    let path = build_path(&operation.path, &path_variables);
    let leftover = unresolved_placeholders(&path);
    if !leftover.is_empty() {
        debug!(operation_id = %operation.operation_id, placeholders = ?leftover, "path placeholders left unresolved");
    }

    let mut query_pairs: Vec<(String, String)> = operation
        .parameters_in(ParameterLocation::Query)
        .filter_map(|parameter| resolved.get(&parameter.name).map(|value| query_pairs_for(&parameter.name, value)))
        .flatten()
        .collect();

    let mut request = HttpRequestDescriptor::new(method, String::new());
    for parameter in operation.parameters_in(ParameterLocation::Header) {
        if let Some(value) = resolved.get(&parameter.name) {
            request.headers.insert(parameter.name.clone(), value_to_path_string(value));
        }
    }

    request.body = assemble_body(operation, resolved);

    match credential {
        Some(credential) => apply_security(operation, catalog, credential, &mut request, &mut query_pairs),
        None if !operation.security.is_empty() => {
            debug!(operation_id = %operation.operation_id, "no credential available; sending unauthenticated");
        }
        None => {}
    }

    request.url = append_query(&format!("{base_url}{path}"), &encode_query(&query_pairs));
    debug!(
        operation_id = %operation.operation_id,
        method = %request.method,
        url = %redact_sensitive(&request.redacted_url()),
        has_body = request.body.is_some(),
        "request synthesized"
    );
    Ok(request)
}

/// Request body for `operation`, if any.
///
/// A value under [`WHOLE_BODY_PARAMETER`] is the entire body. Otherwise each
/// top-level property of an object body schema is copied from `resolved` when
/// present; a string supplied for an array property is split on commas.
fn assemble_body(operation: &Operation, resolved: &IndexMap<String, Value>) -> Option<Value> {
    if let Some(body) = resolved.get(WHOLE_BODY_PARAMETER) {
        return Some(body.clone());
    }

    let properties = operation.request_body_schema.as_ref().and_then(SchemaNode::properties)?;
    let mut body = Map::new();
    for (name, schema) in properties {
        let Some(value) = resolved.get(name) else {
            continue;
        };
        let value = match value {
            Value::String(text) if schema.is_array() => split_list(text),
            other => other.clone(),
        };
        body.insert(name.clone(), value);
    }

    (!body.is_empty()).then_some(Value::Object(body))
}

/// Splits on commas and trims each item; trailing empty items are dropped.
fn split_list(text: &str) -> Value {
    let mut items: Vec<&str> = text.split(',').map(str::trim).collect();
    while items.last().is_some_and(|item| item.is_empty()) {
        items.pop();
    }
    Value::Array(items.into_iter().map(|item| Value::String(item.to_string())).collect())
}

fn apply_security(
    operation: &Operation,
    catalog: &Catalog,
    credential: &Credential,
    request: &mut HttpRequestDescriptor,
    query_pairs: &mut Vec<(String, String)>,
) {
    let Some(requirement) = operation.security.first() else {
        return;
    };

    for scheme_name in requirement.keys() {
        let Some(scheme) = catalog.security_scheme(scheme_name) else {
            warn!(operation_id = %operation.operation_id, scheme = %scheme_name, "security scheme missing from catalog; skipped");
            continue;
        };
        match &scheme.kind {
            SecuritySchemeKind::ApiKey {
                location: ApiKeyLocation::Header,
                parameter_name,
            } => {
                request.headers.insert(parameter_name.clone(), credential.expose().to_string());
                request.mark_sensitive(parameter_name.clone());
            }
            SecuritySchemeKind::ApiKey {
                location: ApiKeyLocation::Query,
                parameter_name,
            } => {
                query_pairs.push((parameter_name.clone(), credential.expose().to_string()));
                request.mark_sensitive(parameter_name.clone());
            }
            SecuritySchemeKind::ApiKey {
                location: ApiKeyLocation::Cookie,
                parameter_name,
            } => {
                let pair = format!("{parameter_name}={}", credential.expose());
                let cookie = match request.headers.get("Cookie") {
                    Some(existing) => format!("{existing}; {pair}"),
                    None => pair,
                };
                request.headers.insert("Cookie".to_string(), cookie);
                request.mark_sensitive("Cookie");
            }
            SecuritySchemeKind::HttpBearer => {
                request
                    .headers
                    .insert("Authorization".to_string(), format!("Bearer {}", credential.expose()));
                request.mark_sensitive("Authorization");
            }
            SecuritySchemeKind::Other { .. } => {
                debug!(operation_id = %operation.operation_id, scheme = %scheme_name, "security scheme kind not applied");
                continue;
            }
        }
        debug!(operation_id = %operation.operation_id, scheme = %scheme_name, "security scheme applied: [REDACTED]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiplan_types::{Parameter, SecurityRequirement, SecurityScheme};
    use serde_json::json;

    fn parameter(name: &str, location: ParameterLocation) -> Parameter {
        Parameter {
            name: name.to_string(),
            location,
            required: true,
            schema: None,
        }
    }

    fn operation(method: &str, path: &str) -> Operation {
        Operation {
            operation_id: "op".into(),
            http_method: method.into(),
            path: path.into(),
            description: None,
            parameters: Vec::new(),
            request_body_schema: None,
            security: Vec::new(),
        }
    }

    fn requirement(schemes: &[&str]) -> SecurityRequirement {
        schemes.iter().map(|name| (name.to_string(), Vec::new())).collect()
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog {
            server_urls: vec!["https://api.example.com/v1/".into(), "https://backup.example.com".into()],
            ..Catalog::default()
        };
        let schemes = [
            SecurityScheme {
                name: "ApiKeyAuth".into(),
                kind: SecuritySchemeKind::ApiKey {
                    location: ApiKeyLocation::Header,
                    parameter_name: "X-API-KEY".into(),
                },
            },
            SecurityScheme {
                name: "QueryKey".into(),
                kind: SecuritySchemeKind::ApiKey {
                    location: ApiKeyLocation::Query,
                    parameter_name: "api_key".into(),
                },
            },
            SecurityScheme {
                name: "SessionCookie".into(),
                kind: SecuritySchemeKind::ApiKey {
                    location: ApiKeyLocation::Cookie,
                    parameter_name: "session".into(),
                },
            },
            SecurityScheme {
                name: "BearerAuth".into(),
                kind: SecuritySchemeKind::HttpBearer,
            },
        ];
        for scheme in schemes {
            catalog.security_schemes.insert(scheme.name.clone(), scheme);
        }
        catalog
    }

    fn params(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs.iter().map(|(name, value)| (name.to_string(), value.clone())).collect()
    }

    #[test]
    fn substitutes_path_parameters() {
        let mut op = operation("GET", "/items/{itemId}");
        op.parameters.push(parameter("itemId", ParameterLocation::Path));

        let request = build_request(&op, &params(&[("itemId", json!("123"))]), &catalog(), None).unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://api.example.com/v1/items/123");
    }

    #[test]
    fn leaves_unmatched_placeholders_in_place() {
        let mut op = operation("GET", "/items/{itemId}/tags/{tagId}");
        op.parameters.push(parameter("itemId", ParameterLocation::Path));
        op.parameters.push(parameter("tagId", ParameterLocation::Path));

        let request = build_request(&op, &params(&[("itemId", json!(7))]), &catalog(), None).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/items/7/tags/{tagId}");
    }

    #[test]
    fn percent_encodes_path_values() {
        let mut op = operation("GET", "/files/{name}");
        op.parameters.push(parameter("name", ParameterLocation::Path));

        let request = build_request(&op, &params(&[("name", json!("a b/c"))]), &catalog(), None).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/files/a%20b%2Fc");
    }

    #[test]
    fn appends_declared_query_parameters_only() {
        let mut op = operation("GET", "/items");
        op.parameters.push(parameter("status", ParameterLocation::Query));
        op.parameters.push(parameter("tag", ParameterLocation::Query));

        let resolved = params(&[
            ("status", json!("active & new")),
            ("tag", json!(["x", "y"])),
            ("undeclared", json!("ignored")),
        ]);
        let request = build_request(&op, &resolved, &catalog(), None).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/items?status=active%20%26%20new&tag=x&tag=y");
        assert!(request.body.is_none());
    }

    #[test]
    fn sends_header_parameters() {
        let mut op = operation("GET", "/items");
        op.parameters.push(parameter("X-Request-Id", ParameterLocation::Header));

        let request = build_request(&op, &params(&[("X-Request-Id", json!("req-1"))]), &catalog(), None).unwrap();
        assert_eq!(request.header("x-request-id"), Some("req-1"));
    }

    #[test]
    fn whole_body_marker_is_used_verbatim() {
        let mut op = operation("POST", "/items");
        op.request_body_schema = Some(SchemaNode::Object {
            properties: [("name".to_string(), SchemaNode::scalar("string"))].into_iter().collect(),
            required: vec!["name".into()],
            description: None,
        });
        let body = json!({"name": "widget", "extra": {"nested": [1, 2]}});

        let resolved = params(&[(WHOLE_BODY_PARAMETER, body.clone()), ("name", json!("other"))]);
        let request = build_request(&op, &resolved, &catalog(), None).unwrap();
        assert_eq!(request.body, Some(body));
    }

    #[test]
    fn assembles_body_from_schema_properties() {
        let mut op = operation("POST", "/items");
        op.request_body_schema = Some(SchemaNode::Object {
            properties: [
                ("name".to_string(), SchemaNode::scalar("string")),
                ("tags".to_string(), SchemaNode::array_of(SchemaNode::scalar("string"))),
                ("ids".to_string(), SchemaNode::array_of(SchemaNode::scalar("integer"))),
                ("note".to_string(), SchemaNode::scalar("string")),
            ]
            .into_iter()
            .collect(),
            required: vec!["name".into(), "note".into()],
            description: None,
        });

        let resolved = params(&[
            ("name", json!("widget")),
            ("tags", json!("a,b,c")),
            ("ids", json!([1, 2])),
            ("unrelated", json!(true)),
        ]);
        let request = build_request(&op, &resolved, &catalog(), None).unwrap();
        assert_eq!(
            request.body,
            Some(json!({"name": "widget", "tags": ["a", "b", "c"], "ids": [1, 2]}))
        );
    }

    #[test]
    fn list_splitting_drops_trailing_empty_items() {
        assert_eq!(split_list("a,b,"), json!(["a", "b"]));
        assert_eq!(split_list("a,,b"), json!(["a", "", "b"]));
        assert_eq!(split_list(""), json!([]));
    }

    #[test]
    fn no_body_when_nothing_matches_the_schema() {
        let mut op = operation("POST", "/items");
        op.request_body_schema = Some(SchemaNode::Object {
            properties: [("name".to_string(), SchemaNode::scalar("string"))].into_iter().collect(),
            required: Vec::new(),
            description: None,
        });

        let request = build_request(&op, &params(&[("other", json!(1))]), &catalog(), None).unwrap();
        assert!(request.body.is_none());
    }

    #[test]
    fn applies_api_key_header_from_first_requirement() {
        let mut op = operation("GET", "/items");
        op.security = vec![requirement(&["ApiKeyAuth"]), requirement(&["BearerAuth"])];
        let credential = Credential::new("my-secret-key");

        let request = build_request(&op, &IndexMap::new(), &catalog(), Some(&credential)).unwrap();
        assert_eq!(request.header("X-API-KEY"), Some("my-secret-key"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn missing_credential_sends_unauthenticated() {
        let mut op = operation("GET", "/items");
        op.security = vec![requirement(&["ApiKeyAuth"])];

        let request = build_request(&op, &IndexMap::new(), &catalog(), None).unwrap();
        assert!(request.headers.is_empty());
    }

    #[test]
    fn applies_bearer_query_and_cookie_schemes() {
        let mut op = operation("GET", "/items");
        op.security = vec![requirement(&["BearerAuth", "QueryKey", "SessionCookie"])];
        let credential = Credential::new("tok");

        let request = build_request(&op, &IndexMap::new(), &catalog(), Some(&credential)).unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer tok"));
        assert_eq!(request.header("Cookie"), Some("session=tok"));
        assert_eq!(request.url, "https://api.example.com/v1/items?api_key=tok");
    }

    #[test]
    fn credential_bearing_names_are_marked_sensitive() {
        let mut catalog = catalog();
        for (name, location, parameter_name) in [
            ("ClientAuth", ApiKeyLocation::Header, "X-Client-Auth"),
            ("AccessParam", ApiKeyLocation::Query, "access"),
        ] {
            catalog.security_schemes.insert(
                name.into(),
                SecurityScheme {
                    name: name.into(),
                    kind: SecuritySchemeKind::ApiKey {
                        location,
                        parameter_name: parameter_name.into(),
                    },
                },
            );
        }
        let mut op = operation("GET", "/items");
        op.security = vec![requirement(&["ClientAuth", "AccessParam", "BearerAuth"])];
        let credential = Credential::new("s3cr3t-value");

        let request = build_request(&op, &IndexMap::new(), &catalog, Some(&credential)).unwrap();
        assert!(request.is_sensitive("X-Client-Auth"));
        assert!(request.is_sensitive("access"));
        assert!(request.is_sensitive("Authorization"));
        assert_eq!(request.redacted_url(), "https://api.example.com/v1/items?access=<redacted>");
        assert!(!format!("{request:?}").contains("s3cr3t-value"));
    }

    #[test]
    fn unknown_scheme_names_are_skipped() {
        let mut op = operation("GET", "/items");
        op.security = vec![requirement(&["Missing", "ApiKeyAuth"])];
        let credential = Credential::new("k");

        let request = build_request(&op, &IndexMap::new(), &catalog(), Some(&credential)).unwrap();
        assert_eq!(request.header("X-API-KEY"), Some("k"));
    }

    #[test]
    fn rejects_unsupported_methods() {
        let op = operation("TRACE", "/items");
        let error = build_request(&op, &IndexMap::new(), &catalog(), None).unwrap_err();
        assert!(matches!(error, StepError::UnsupportedMethod(_)));
    }

    #[test]
    fn methods_are_case_insensitive() {
        let op = operation("patch", "/items");
        let request = build_request(&op, &IndexMap::new(), &catalog(), None).unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
    }

    #[test]
    fn missing_server_url_is_a_configuration_error() {
        let op = operation("GET", "/items");
        let error = build_request(&op, &IndexMap::new(), &Catalog::default(), None).unwrap_err();
        assert!(matches!(error, StepError::Configuration(_)));
    }
}
