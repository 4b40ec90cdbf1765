//! Shared type definitions for the plan execution engine.
//!
//! The catalog types describe a learned REST API in normalized form; the plan
//! types describe what to call and where each parameter value comes from. Both
//! are plain serde data: they are produced by external collaborators (the document
//! importer and the planner) and consumed read-only by `apiplan-engine`.

pub mod catalog;
pub mod credential;
pub mod plan;
pub mod request;
pub mod schema;

pub use catalog::{ApiKeyLocation, Catalog, Operation, Parameter, ParameterLocation, SecurityRequirement, SecurityScheme, SecuritySchemeKind};
pub use credential::Credential;
pub use plan::{ExecutionPlan, ExecutionStep, ParameterSource};
pub use request::{HttpMethod, HttpRequestDescriptor, UnsupportedMethodError};
pub use schema::SchemaNode;

/// Reserved parameter name whose value, when present, is used verbatim as the whole request body.
pub const WHOLE_BODY_PARAMETER: &str = "__requestBody__";
