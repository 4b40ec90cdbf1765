//! Error taxonomy for plan runs.
//!
//! Every error is fatal to the current run. Errors raised while a step is
//! being processed are wrapped in [`EngineError::StepFailed`] together with
//! the failing step id and operation id.

use std::io;

use apiplan_api::TransportError;
use apiplan_types::UnsupportedMethodError;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::provider::ProviderError;

/// Structural problems detected before any step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("plan contains no steps")]
    Empty,
    #[error("step {step_id} references unknown operation '{operation_id}'")]
    UnknownOperation { step_id: String, operation_id: String },
    #[error("step id '{step_id}' appears more than once")]
    DuplicateStepId { step_id: String },
}

/// Failure while resolving, synthesizing or sending a single step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("operation '{operation_id}' is not in the catalog")]
    UnknownOperation { operation_id: String },
    #[error("parameter '{parameter}' depends on step {from_step}, which has no result")]
    UnresolvedDependency { parameter: String, from_step: String },
    #[error("parameter '{parameter}' could not be extracted from step {from_step} with '{path}': {source}")]
    ExtractionFailure {
        parameter: String,
        from_step: String,
        path: String,
        #[source]
        source: ExtractionError,
    },
    #[error("no value could be read for parameter '{parameter}': {source}")]
    InputUnavailable {
        parameter: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethodError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Error returned by a plan run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no API specification found for alias '{alias}'")]
    SpecificationNotFound { alias: String },
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("step {step_id} ({operation_id}) failed: {source}")]
    StepFailed {
        step_id: String,
        operation_id: String,
        #[source]
        source: StepError,
    },
}

impl EngineError {
    /// The underlying step error when the run aborted inside a step.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            EngineError::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Id of the step the run aborted on, if it got that far.
    pub fn failed_step_id(&self) -> Option<&str> {
        match self {
            EngineError::StepFailed { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}
