//! Declarative multi-step execution plans.
//!
//! Plans are produced by an external planner and deserialize from its JSON
//! output. Both the canonical source tags (`literal`, `interactive`,
//! `derived`) and the planner's upper-case tags (`STATIC`, `USER_INPUT`,
//! `FROM_STEP`) are accepted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Origin of a single parameter value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ParameterSource {
    /// A value fixed in the plan.
    #[serde(alias = "STATIC")]
    Literal {
        #[serde(default)]
        value: Value,
    },
    /// A value typed by the operator when the step runs.
    #[serde(alias = "USER_INPUT")]
    Interactive,
    /// A value extracted from the stored result of an earlier step.
    #[serde(alias = "FROM_STEP")]
    Derived {
        #[serde(rename = "stepId", alias = "from_step", alias = "fromStep")]
        from_step: String,
        #[serde(rename = "jsonPath", alias = "path")]
        path: String,
    },
}

impl ParameterSource {
    pub fn literal(value: impl Into<Value>) -> Self {
        ParameterSource::Literal { value: value.into() }
    }

    pub fn derived(from_step: impl Into<String>, path: impl Into<String>) -> Self {
        ParameterSource::Derived {
            from_step: from_step.into(),
            path: path.into(),
        }
    }
}

/// One planned operation invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// Unique within the plan; later steps reference it from `Derived` sources.
    pub step_id: String,
    pub operation_id: String,
    /// Display-only explanation of why the step exists.
    #[serde(default)]
    pub reasoning: String,
    /// Parameter sources keyed by parameter name, in plan order.
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterSource>,
}

impl ExecutionStep {
    pub fn new(step_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            operation_id: operation_id.into(),
            reasoning: String::new(),
            parameters: IndexMap::new(),
        }
    }

    /// Builder-style helper used by tests and embedders.
    pub fn with_parameter(mut self, name: impl Into<String>, source: ParameterSource) -> Self {
        self.parameters.insert(name.into(), source);
        self
    }

    /// Step ids this step reads results from, in declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.parameters.values().filter_map(|source| match source {
            ParameterSource::Derived { from_step, .. } => Some(from_step.as_str()),
            _ => None,
        })
    }
}

/// Ordered sequence of steps. Order is execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlan {
    #[serde(default)]
    pub steps: Vec<ExecutionStep>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<ExecutionStep>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
