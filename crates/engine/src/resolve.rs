//! # Parameter Resolution
//!
//! Turns a step's declared parameter sources into concrete JSON values.
//!
//! - **Literal** values are returned exactly as the plan stores them.
//! - **Interactive** values are read from the operator through an
//!   [`InteractiveInput`] collaborator. The answer is trimmed and kept as a
//!   JSON string; no numeric or boolean coercion happens here.
//! - **Derived** values are extracted from the stored result of an earlier
//!   step held in the run's [`StepResultCache`].
//!
//! ## Usage
//!
//! ```rust
//! use apiplan_engine::resolve::{StepResultCache, resolve};
//! use apiplan_types::{ExecutionStep, ParameterSource};
//! use serde_json::json;
//!
//! let mut cache = StepResultCache::new();
//! cache.insert("1", json!({"id": "abc123"}));
//!
//! let step = ExecutionStep::new("2", "getItemById")
//!     .with_parameter("itemId", ParameterSource::derived("1", "$.id"))
//!     .with_parameter("verbose", ParameterSource::literal(true));
//!
//! let no_prompt = |_: &str| -> std::io::Result<String> { unreachable!() };
//! let resolved = resolve(&step, &cache, &no_prompt)?;
//! assert_eq!(resolved["itemId"], json!("abc123"));
//! assert_eq!(resolved["verbose"], json!(true));
//! # Ok::<(), apiplan_engine::StepError>(())
//! ```

use std::io;

use apiplan_types::{ExecutionStep, ParameterSource};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::{error::StepError, extract::extract};

/// Source of operator-supplied values for `Interactive` parameters.
///
/// Implementations block until an answer is available. Closures of the shape
/// `Fn(&str) -> io::Result<String>` implement this trait.
pub trait InteractiveInput: Send + Sync {
    /// Shows `label` to the operator and returns the raw answer.
    fn prompt(&self, label: &str) -> io::Result<String>;
}

impl<F> InteractiveInput for F
where
    F: Fn(&str) -> io::Result<String> + Send + Sync,
{
    fn prompt(&self, label: &str) -> io::Result<String> {
        self(label)
    }
}

/// Prompt shown to the operator for an `Interactive` parameter.
pub fn prompt_label(parameter: &str) -> String {
    format!("Please provide a value for '{parameter}': ")
}

/// Results of the steps executed so far in one run, keyed by step id.
///
/// A cache is created empty for every run and only grows: a step's result is
/// inserted once the step has succeeded, so at any point it holds exactly the
/// steps that ran before the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResultCache {
    results: IndexMap<String, Value>,
}

impl StepResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step_id: impl Into<String>, result: Value) {
        self.results.insert(step_id.into(), result);
    }

    pub fn get(&self, step_id: &str) -> Option<&Value> {
        self.results.get(step_id)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.results.contains_key(step_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Step ids and results in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.results.iter().map(|(step_id, result)| (step_id.as_str(), result))
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

/// Resolves every parameter of `step`, in declaration order.
///
/// # Errors
///
/// - [`StepError::UnresolvedDependency`] when a derived parameter names a step
///   with no cached result (never ran, or appears later in the plan).
/// - [`StepError::ExtractionFailure`] when the extraction path is malformed or
///   matches nothing in the cached result.
/// - [`StepError::InputUnavailable`] when the operator input could not be read.
pub fn resolve(
    step: &ExecutionStep,
    cache: &StepResultCache,
    input: &dyn InteractiveInput,
) -> Result<IndexMap<String, Value>, StepError> {
    let mut resolved = IndexMap::with_capacity(step.parameters.len());

    for (name, source) in &step.parameters {
        let value = match source {
            ParameterSource::Literal { value } => value.clone(),
            ParameterSource::Interactive => {
                let answer = input.prompt(&prompt_label(name)).map_err(|source| StepError::InputUnavailable {
                    parameter: name.clone(),
                    source,
                })?;
                Value::String(answer.trim().to_string())
            }
            ParameterSource::Derived { from_step, path } => {
                let stored = cache.get(from_step).ok_or_else(|| StepError::UnresolvedDependency {
                    parameter: name.clone(),
                    from_step: from_step.clone(),
                })?;
                extract(stored, path).map_err(|source| StepError::ExtractionFailure {
                    parameter: name.clone(),
                    from_step: from_step.clone(),
                    path: path.clone(),
                    source,
                })?
            }
        };
        debug!(step_id = %step.step_id, parameter = %name, source = source_kind(source), "parameter resolved");
        resolved.insert(name.clone(), value);
    }

    Ok(resolved)
}

fn source_kind(source: &ParameterSource) -> &'static str {
    match source {
        ParameterSource::Literal { .. } => "literal",
        ParameterSource::Interactive => "interactive",
        ParameterSource::Derived { .. } => "derived",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionError;
    use serde_json::json;
    use std::sync::Mutex;

    fn refuse_prompt(label: &str) -> io::Result<String> {
        panic!("unexpected prompt: {label}")
    }

    #[test]
    fn literal_is_returned_verbatim_regardless_of_cache() {
        let value = json!({"name": "widget", "tags": ["a", "b"], "count": 3});
        let step = ExecutionStep::new("1", "createItem").with_parameter("__requestBody__", ParameterSource::literal(value.clone()));

        let mut cache = StepResultCache::new();
        let empty = resolve(&step, &cache, &refuse_prompt).unwrap();
        cache.insert("0", json!({"unrelated": true}));
        let populated = resolve(&step, &cache, &refuse_prompt).unwrap();

        assert_eq!(empty["__requestBody__"], value);
        assert_eq!(populated, empty);
    }

    #[test]
    fn derived_extracts_from_earlier_result() {
        let mut cache = StepResultCache::new();
        cache.insert("1", json!({"id": "abc123"}));
        let step = ExecutionStep::new("2", "getItemById").with_parameter("itemId", ParameterSource::derived("1", "$.id"));

        let resolved = resolve(&step, &cache, &refuse_prompt).unwrap();
        assert_eq!(resolved["itemId"], json!("abc123"));
    }

    #[test]
    fn derived_without_cached_step_is_unresolved_dependency() {
        let step = ExecutionStep::new("1", "getItemById").with_parameter("itemId", ParameterSource::derived("99", "$.id"));

        let error = resolve(&step, &StepResultCache::new(), &refuse_prompt).unwrap_err();
        match error {
            StepError::UnresolvedDependency { parameter, from_step } => {
                assert_eq!(parameter, "itemId");
                assert_eq!(from_step, "99");
            }
            other => panic!("expected unresolved dependency, got {other:?}"),
        }
    }

    #[test]
    fn derived_path_matching_nothing_is_extraction_failure() {
        let mut cache = StepResultCache::new();
        cache.insert("1", json!({"id": "abc123"}));
        let step = ExecutionStep::new("2", "getItemById").with_parameter("itemId", ParameterSource::derived("1", "$.missing"));

        let error = resolve(&step, &cache, &refuse_prompt).unwrap_err();
        assert!(matches!(
            error,
            StepError::ExtractionFailure {
                source: ExtractionError::NoMatch,
                ..
            }
        ));
    }

    #[test]
    fn interactive_prompts_with_parameter_name_and_trims_answer() {
        let labels = Mutex::new(Vec::new());
        let input = |label: &str| -> io::Result<String> {
            labels.lock().unwrap().push(label.to_string());
            Ok("  active \n".to_string())
        };
        let step = ExecutionStep::new("1", "get_items").with_parameter("status", ParameterSource::Interactive);

        let resolved = resolve(&step, &StepResultCache::new(), &input).unwrap();
        assert_eq!(resolved["status"], json!("active"));
        assert_eq!(labels.into_inner().unwrap(), vec!["Please provide a value for 'status': ".to_string()]);
    }

    #[test]
    fn interactive_answers_are_not_coerced() {
        let input = |_: &str| -> io::Result<String> { Ok("42".to_string()) };
        let step = ExecutionStep::new("1", "listItems").with_parameter("limit", ParameterSource::Interactive);

        let resolved = resolve(&step, &StepResultCache::new(), &input).unwrap();
        assert_eq!(resolved["limit"], json!("42"));
    }

    #[test]
    fn unreadable_input_is_reported() {
        let input = |_: &str| -> io::Result<String> { Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")) };
        let step = ExecutionStep::new("1", "get_items").with_parameter("status", ParameterSource::Interactive);

        let error = resolve(&step, &StepResultCache::new(), &input).unwrap_err();
        assert!(matches!(error, StepError::InputUnavailable { ref parameter, .. } if parameter == "status"));
    }

    #[test]
    fn preserves_declaration_order() {
        let step = ExecutionStep::new("1", "search")
            .with_parameter("zeta", ParameterSource::literal(1))
            .with_parameter("alpha", ParameterSource::literal(2));

        let resolved = resolve(&step, &StepResultCache::new(), &refuse_prompt).unwrap();
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }
}
