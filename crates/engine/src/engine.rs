//! The engine's outward surface: `execute(plan, alias)`.

use std::sync::Arc;

use apiplan_types::{Catalog, ExecutionPlan};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::EngineError,
    executor::{HttpSender, PlanExecutor},
    provider::{CatalogProvider, CredentialProvider},
    resolve::InteractiveInput,
    validate::validate_plan,
};

/// Binds the four collaborators a run needs: catalogs, credentials, an HTTP
/// sender and operator input.
///
/// Each call to [`Engine::execute`] is an independent run with a fresh result
/// cache. The catalog and credential are looked up once per run.
#[derive(Clone)]
pub struct Engine {
    catalogs: Arc<dyn CatalogProvider>,
    credentials: Arc<dyn CredentialProvider>,
    sender: Arc<dyn HttpSender>,
    input: Arc<dyn InteractiveInput>,
}

impl Engine {
    pub fn new(
        catalogs: Arc<dyn CatalogProvider>,
        credentials: Arc<dyn CredentialProvider>,
        sender: Arc<dyn HttpSender>,
        input: Arc<dyn InteractiveInput>,
    ) -> Self {
        Self {
            catalogs,
            credentials,
            sender,
            input,
        }
    }

    /// Loads the catalog for `alias`.
    ///
    /// # Errors
    ///
    /// [`EngineError::SpecificationNotFound`] when nothing is stored for the alias.
    pub fn catalog(&self, alias: &str) -> Result<Catalog, EngineError> {
        self.catalogs
            .catalog(alias)?
            .ok_or_else(|| EngineError::SpecificationNotFound { alias: alias.to_string() })
    }

    /// Checks `plan` against the catalog of `alias` without executing anything.
    pub fn validate(&self, plan: &ExecutionPlan, alias: &str) -> Result<(), EngineError> {
        let catalog = self.catalog(alias)?;
        validate_plan(plan, &catalog)?;
        debug!(alias, steps = plan.len(), "plan validated");
        Ok(())
    }

    /// Executes `plan` against the API learned as `alias` and returns the JSON
    /// result of its last step.
    ///
    /// The plan is validated by [`PlanExecutor::execute`] before any step runs.
    pub fn execute(&self, plan: &ExecutionPlan, alias: &str) -> Result<Value, EngineError> {
        let catalog = self.catalog(alias)?;
        let credential = self.credentials.credential(alias)?;
        info!(alias, steps = plan.len(), credential = credential.is_some(), "running plan");

        let mut executor = PlanExecutor::new(&catalog, credential.as_ref(), self.sender.as_ref(), self.input.as_ref());
        executor.execute(plan)
    }
}
