//! Structural checks run before any step of a plan is executed.

use std::collections::HashSet;

use apiplan_types::{Catalog, ExecutionPlan};

use crate::error::PlanError;

/// Checks `plan` against `catalog`.
///
/// Rejects an empty plan, then reports the first step whose operation id is
/// missing from the catalog, then the first repeated step id. References
/// between steps are not checked here; a reference to a step that has not run
/// surfaces as an unresolved dependency when the referencing step resolves.
pub fn validate_plan(plan: &ExecutionPlan, catalog: &Catalog) -> Result<(), PlanError> {
    if plan.is_empty() {
        return Err(PlanError::Empty);
    }

    if let Some(step) = plan.steps.iter().find(|step| catalog.operation(&step.operation_id).is_none()) {
        return Err(PlanError::UnknownOperation {
            step_id: step.step_id.clone(),
            operation_id: step.operation_id.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(plan.len());
    for step in &plan.steps {
        if !seen.insert(step.step_id.as_str()) {
            return Err(PlanError::DuplicateStepId {
                step_id: step.step_id.clone(),
            });
        }
    }

    Ok(())
}
