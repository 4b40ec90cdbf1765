//! Plan execution: validates a plan, then runs its steps strictly in order.
//!
//! - `sender::HttpSender` abstracts how a synthesized request is sent
//! - `sender::DryRunSender` answers every request with an echo of itself
//! - [`PlanExecutor`] drives resolve, synthesize, send and store for each
//!   step and exposes its [`RunState`] and result cache for inspection
//!
//! Execution is synchronous. The first failing step aborts the run; steps
//! that already ran are not undone.

use std::time::Instant;

use apiplan_types::{Catalog, Credential, ExecutionPlan, ExecutionStep};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::{EngineError, StepError},
    resolve::{InteractiveInput, StepResultCache, resolve},
    synthesize::build_request,
    validate::validate_plan,
};

pub mod sender;
pub use sender::{DryRunSender, HttpSender};

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "step_index", rename_all = "snake_case")]
pub enum RunState {
    /// No run started, or the last plan was rejected by validation.
    Idle,
    /// Processing the step at this zero-based index.
    Running(usize),
    Completed,
    Aborted,
}

/// Runs plans against one catalog with fixed collaborators.
///
/// The result cache belongs to a single run: it is cleared when a new run
/// starts and otherwise only grows. After an abort it still holds the results
/// of the steps that succeeded.
pub struct PlanExecutor<'a> {
    catalog: &'a Catalog,
    credential: Option<&'a Credential>,
    sender: &'a dyn HttpSender,
    input: &'a dyn InteractiveInput,
    state: RunState,
    cache: StepResultCache,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(
        catalog: &'a Catalog,
        credential: Option<&'a Credential>,
        sender: &'a dyn HttpSender,
        input: &'a dyn InteractiveInput,
    ) -> Self {
        Self {
            catalog,
            credential,
            sender,
            input,
            state: RunState::Idle,
            cache: StepResultCache::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Results stored by the current or most recent run.
    pub fn results(&self) -> &StepResultCache {
        &self.cache
    }

    /// Validates and executes `plan`, returning the last step's JSON result.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPlan`] before anything is sent, or
    /// [`EngineError::StepFailed`] naming the step the run aborted on.
    pub fn execute(&mut self, plan: &ExecutionPlan) -> Result<Value, EngineError> {
        self.state = RunState::Idle;
        self.cache.clear();

        validate_plan(plan, self.catalog).inspect_err(|error| {
            warn!(error = %error, "plan rejected before execution");
        })?;

        let started = Instant::now();
        info!(steps = plan.len(), authenticated = self.credential.is_some(), "plan execution started");

        let mut last_result = Value::Null;
        for (index, step) in plan.steps.iter().enumerate() {
            self.state = RunState::Running(index);
            let step_started = Instant::now();
            debug!(step_id = %step.step_id, operation_id = %step.operation_id, index, "step execution started");

            match self.run_step(step) {
                Ok(result) => {
                    info!(
                        step_id = %step.step_id,
                        operation_id = %step.operation_id,
                        duration_ms = step_started.elapsed().as_millis(),
                        "step execution succeeded"
                    );
                    self.cache.insert(step.step_id.clone(), result.clone());
                    last_result = result;
                }
                Err(source) => {
                    self.state = RunState::Aborted;
                    warn!(
                        step_id = %step.step_id,
                        operation_id = %step.operation_id,
                        error = %source,
                        completed_steps = index,
                        "step execution failed; aborting plan"
                    );
                    return Err(EngineError::StepFailed {
                        step_id: step.step_id.clone(),
                        operation_id: step.operation_id.clone(),
                        source,
                    });
                }
            }
        }

        self.state = RunState::Completed;
        info!(
            steps = plan.len(),
            duration_ms = started.elapsed().as_millis(),
            "plan execution completed"
        );
        Ok(last_result)
    }

    fn run_step(&self, step: &ExecutionStep) -> Result<Value, StepError> {
        // Validation already checked this; the catalog lookup is still needed for the operation itself.
        let operation = self
            .catalog
            .operation(&step.operation_id)
            .ok_or_else(|| StepError::UnknownOperation {
                operation_id: step.operation_id.clone(),
            })?;

        let resolved = resolve(step, &self.cache, self.input)?;
        let request = build_request(operation, &resolved, self.catalog, self.credential)?;
        Ok(self.sender.send(request)?)
    }
}
