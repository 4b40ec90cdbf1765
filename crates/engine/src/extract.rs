//! Extraction paths: pulling a sub-value out of a stored step result.
//!
//! The accepted language is a JSONPath subset:
//!
//! - `$` is the root; `$.a.b`, `$['a']["b"]`, `$.items[0]`, `$.items[-1]`
//! - `[*]` and `.*` select every element of an array or every member value of an object
//! - a path without `$` is read as a dotted path: `items.0.id` equals `$.items[0].id`
//!
//! A path without wildcards yields the single value it points at. A path with a
//! wildcard yields a JSON array of every match. A path that matches nothing is
//! an error, never a silent `null`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("invalid extraction path: {0}")]
    Syntax(String),
    #[error("path matched nothing")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(i64),
    Wildcard,
}

/// Applies `path` to `document` and returns the selected value.
///
/// ```rust
/// use apiplan_engine::extract::extract;
/// use serde_json::json;
///
/// let result = json!({"id": "abc123", "items": [{"id": 1}, {"id": 2}]});
/// assert_eq!(extract(&result, "$.id").unwrap(), json!("abc123"));
/// assert_eq!(extract(&result, "items.1.id").unwrap(), json!(2));
/// assert_eq!(extract(&result, "$.items[*].id").unwrap(), json!([1, 2]));
/// assert!(extract(&result, "$.missing").is_err());
/// ```
pub fn extract(document: &Value, path: &str) -> Result<Value, ExtractionError> {
    let segments = parse_path(path)?;
    let definite = !segments.contains(&Segment::Wildcard);

    let mut current: Vec<&Value> = vec![document];
    for segment in &segments {
        current = current.into_iter().flat_map(|value| apply_segment(value, segment)).collect();
        if current.is_empty() {
            return Err(ExtractionError::NoMatch);
        }
    }

    if definite {
        current.first().map(|value| (*value).clone()).ok_or(ExtractionError::NoMatch)
    } else {
        Ok(Value::Array(current.into_iter().cloned().collect()))
    }
}

fn apply_segment<'a>(value: &'a Value, segment: &Segment) -> Vec<&'a Value> {
    match (segment, value) {
        (Segment::Key(key), Value::Object(map)) => map.get(key).into_iter().collect(),
        (Segment::Key(key), Value::Array(items)) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .into_iter()
            .collect(),
        (Segment::Index(index), Value::Array(items)) => resolve_index(items.len(), *index)
            .and_then(|position| items.get(position))
            .into_iter()
            .collect(),
        (Segment::Wildcard, Value::Array(items)) => items.iter().collect(),
        (Segment::Wildcard, Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        let from_end = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(from_end)
    }
}

fn parse_path(path: &str) -> Result<Vec<Segment>, ExtractionError> {
    let trimmed = path.trim();
    let body = match trimmed.strip_prefix('$') {
        Some(rest) => rest,
        None if trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('.') => trimmed,
        // Bare dotted path: read `a.b` as `.a.b`.
        None => return parse_segments(&format!(".{trimmed}")),
    };
    parse_segments(body)
}

fn parse_segments(body: &str) -> Result<Vec<Segment>, ExtractionError> {
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        match chars[position] {
            '.' => {
                position += 1;
                if chars.get(position) == Some(&'.') {
                    return Err(ExtractionError::Syntax("recursive descent ('..') is not supported".into()));
                }
                if chars.get(position) == Some(&'*') {
                    segments.push(Segment::Wildcard);
                    position += 1;
                    continue;
                }
                let start = position;
                while position < chars.len() && chars[position] != '.' && chars[position] != '[' {
                    position += 1;
                }
                if start == position {
                    return Err(ExtractionError::Syntax(format!("empty member name at offset {start}")));
                }
                segments.push(Segment::Key(chars[start..position].iter().collect()));
            }
            '[' => {
                let close = chars[position..]
                    .iter()
                    .position(|ch| *ch == ']')
                    .map(|offset| position + offset)
                    .ok_or_else(|| ExtractionError::Syntax(format!("unclosed '[' at offset {position}")))?;
                let inner: String = chars[position + 1..close].iter().collect();
                segments.push(parse_bracket(inner.trim())?);
                position = close + 1;
            }
            other => {
                return Err(ExtractionError::Syntax(format!("unexpected '{other}' at offset {position}")));
            }
        }
    }

    Ok(segments)
}

fn parse_bracket(inner: &str) -> Result<Segment, ExtractionError> {
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    for quote in ['\'', '"'] {
        if let Some(name) = inner.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return Ok(Segment::Key(name.to_string()));
        }
    }
    inner
        .parse::<i64>()
        .map(Segment::Index)
        .map_err(|_| ExtractionError::Syntax(format!("unsupported bracket expression '[{inner}]'")))
}
