use percent_encoding::utf8_percent_encode;
use serde_json::{Map, Value};

use super::query::UNRESERVED_ONLY;

/// Resolves an OpenAPI-style path template (`/items/{itemId}`) against the
/// supplied variables.
///
/// Each variable replaces every `{name}` token with its percent-encoded string
/// form. Placeholders with no matching variable stay in the output verbatim;
/// use [`unresolved_placeholders`] to report them.
///
/// # Examples
/// ```rust
/// use apiplan_util::build_path;
/// use serde_json::{Map, Value};
///
/// let mut variables = Map::new();
/// variables.insert("itemId".to_string(), Value::String("123".to_string()));
/// assert_eq!(build_path("/items/{itemId}", &variables), "/items/123");
/// assert_eq!(build_path("/items/{itemId}/tags/{tagId}", &variables), "/items/123/tags/{tagId}");
/// ```
pub fn build_path(template: &str, variables: &Map<String, Value>) -> String {
    let mut path = template.to_string();
    for (name, value) in variables {
        let text = value_to_path_string(value);
        let encoded = utf8_percent_encode(&text, UNRESERVED_ONLY).to_string();
        path = path.replace(&format!("{{{}}}", name), &encoded);
    }
    path
}

/// String form of a JSON value as it appears in a URL: strings are used raw,
/// everything else uses its JSON text.
pub fn value_to_path_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Lists the `{name}` placeholders still present in a path.
pub fn unresolved_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                names.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}
