//! # apiplan engine
//!
//! Executes declarative multi-step plans against a REST API described by a
//! [`Catalog`](apiplan_types::Catalog).
//!
//! A run validates the plan, then for each step in order resolves its
//! parameters, synthesizes the HTTP request, sends it and stores the JSON
//! result so that later steps can derive values from it. The first failure
//! aborts the run; the value of a completed run is the last step's result.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use apiplan_engine::{DryRunSender, Engine, InMemoryCatalogStore, InMemoryCredentialStore};
//! use apiplan_types::{Catalog, ExecutionPlan};
//!
//! let catalog = Catalog::from_json_str(r#"{
//!     "serverUrls": ["https://api.example.com"],
//!     "operations": {
//!         "listItems": { "operationId": "listItems", "httpMethod": "GET", "path": "/items" }
//!     }
//! }"#)?;
//! let plan = ExecutionPlan::from_json_str(r#"{
//!     "steps": [{ "stepId": "1", "operationId": "listItems", "parameters": {} }]
//! }"#)?;
//!
//! let engine = Engine::new(
//!     Arc::new(InMemoryCatalogStore::new().with_catalog("items", catalog)),
//!     Arc::new(InMemoryCredentialStore::new()),
//!     Arc::new(DryRunSender),
//!     Arc::new(|_: &str| -> std::io::Result<String> { Ok(String::new()) }),
//! );
//! let echo = engine.execute(&plan, "items")?;
//! assert_eq!(echo["url"], "https://api.example.com/items");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`validate`**: structural checks before anything is sent
//! - **`resolve`**: parameter resolution and the run-scoped result cache
//! - **`extract`**: the extraction path language used by derived parameters
//! - **`synthesize`**: request synthesis (path, query, headers, body, auth)
//! - **`executor`**: the sequential run loop and the HTTP sender seam
//! - **`provider`**: catalog and credential collaborators

mod engine;
pub mod error;
pub mod executor;
pub mod extract;
pub mod provider;
pub mod resolve;
pub mod synthesize;
pub mod validate;

pub use engine::Engine;
pub use error::{EngineError, PlanError, StepError};
pub use executor::{DryRunSender, HttpSender, PlanExecutor, RunState};
pub use extract::{ExtractionError, extract};
pub use provider::{
    CatalogProvider, CredentialProvider, DirectoryCatalogStore, InMemoryCatalogStore, InMemoryCredentialStore, ProviderError,
};
pub use resolve::{InteractiveInput, StepResultCache, prompt_label, resolve};
pub use synthesize::build_request;
pub use validate::validate_plan;
