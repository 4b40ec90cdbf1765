//! Read-only collaborators that supply a run's catalog and credential.
//!
//! Modules:
//! - `catalog_store`: in-memory and directory-backed catalog providers
//! - `credentials`: keystore-backed and in-memory credential providers

mod catalog_store;
mod credentials;

use std::{io, path::PathBuf};

use apiplan_types::{Catalog, Credential};
use apiplan_util::keystore::KeystoreError;
use thiserror::Error;

pub use catalog_store::{DirectoryCatalogStore, InMemoryCatalogStore};
pub use credentials::InMemoryCredentialStore;

/// Failure inside a provider, as opposed to "nothing stored for this alias".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("alias '{alias}' is not a valid catalog name")]
    InvalidAlias { alias: String },
    #[error("failed to read catalog for '{alias}' from {}: {source}", path.display())]
    CatalogRead {
        alias: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog for '{alias}' at {} is malformed: {source}", path.display())]
    CatalogParse {
        alias: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Credential(#[from] KeystoreError),
}

/// Supplies the catalog learned for an alias.
pub trait CatalogProvider: Send + Sync {
    /// `Ok(None)` when nothing is stored for `alias`.
    fn catalog(&self, alias: &str) -> Result<Option<Catalog>, ProviderError>;
}

/// Supplies the credential stored for an alias.
pub trait CredentialProvider: Send + Sync {
    /// `Ok(None)` when nothing is stored for `alias`.
    fn credential(&self, alias: &str) -> Result<Option<Credential>, ProviderError>;
}
