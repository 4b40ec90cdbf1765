use std::collections::HashMap;

use apiplan_types::Credential;
use apiplan_util::keystore::Keystore;

use super::{CredentialProvider, ProviderError};

impl CredentialProvider for Keystore {
    fn credential(&self, alias: &str) -> Result<Option<Credential>, ProviderError> {
        Ok(Keystore::credential(self, alias)?)
    }
}

/// Credentials held in memory, keyed by alias.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: HashMap<String, Credential>,
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("aliases", &self.credentials.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, alias: impl Into<String>, credential: impl Into<Credential>) -> Self {
        self.credentials.insert(alias.into(), credential.into());
        self
    }
}

impl CredentialProvider for InMemoryCredentialStore {
    fn credential(&self, alias: &str) -> Result<Option<Credential>, ProviderError> {
        Ok(self.credentials.get(alias).cloned())
    }
}
