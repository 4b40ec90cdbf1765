//! Read-only credential lookup for API aliases.
//!
//! Credentials live either in the OS keychain (service `apiplan`, account =
//! alias) or, when `APIPLAN_SECRETS_BACKEND=env`, in process environment
//! variables named `APIPLAN_CREDENTIAL_<ALIAS>`. Storing credentials is the
//! job of whatever tool learned the API; this module only reads them.

use apiplan_types::Credential;
use thiserror::Error;
use tracing::debug;

const SERVICE: &str = "apiplan";
/// Environment variable used to select the secret resolution backend.
pub const SECRETS_BACKEND_ENV_VAR: &str = "APIPLAN_SECRETS_BACKEND";
/// Prefix of per-alias credential variables in environment mode.
pub const CREDENTIAL_ENV_PREFIX: &str = "APIPLAN_CREDENTIAL_";

/// Secret resolution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    Keychain,
    Environment,
}

impl SecretsBackend {
    fn from_env_var(raw: Option<String>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "env" => Self::Environment,
            _ => Self::Keychain,
        }
    }
}

/// Determine the currently configured secrets backend.
pub fn secrets_backend() -> SecretsBackend {
    SecretsBackend::from_env_var(std::env::var(SECRETS_BACKEND_ENV_VAR).ok())
}

/// Name of the environment variable holding the credential for `alias`.
///
/// The alias is upper-cased and every non-alphanumeric byte becomes `_`.
pub fn credential_env_var(alias: &str) -> String {
    let normalized: String = alias
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{CREDENTIAL_ENV_PREFIX}{normalized}")
}

#[derive(Debug, Error, Clone)]
pub enum KeystoreError {
    #[error("keyring error for {alias}: {error}")]
    Keyring { alias: String, error: String },
}

/// Credential lookups against the configured backend.
#[derive(Debug, Clone, Copy)]
pub struct Keystore {
    backend: SecretsBackend,
}

impl Default for Keystore {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Keystore {
    pub fn new(backend: SecretsBackend) -> Self {
        Self { backend }
    }

    /// Uses the backend selected by `APIPLAN_SECRETS_BACKEND`.
    pub fn from_env() -> Self {
        Self::new(secrets_backend())
    }

    pub fn backend(&self) -> SecretsBackend {
        self.backend
    }

    /// Returns the stored credential for `alias`, or `None` when nothing is stored.
    pub fn credential(&self, alias: &str) -> Result<Option<Credential>, KeystoreError> {
        match self.backend {
            SecretsBackend::Environment => {
                let variable = credential_env_var(alias);
                let value = std::env::var(&variable).ok().filter(|value| !value.trim().is_empty());
                debug!(alias, variable = %variable, found = value.is_some(), "credential lookup in environment");
                Ok(value.map(Credential::new))
            }
            SecretsBackend::Keychain => {
                let entry = keyring::Entry::new(SERVICE, alias).map_err(|error| KeystoreError::Keyring {
                    alias: alias.to_string(),
                    error: error.to_string(),
                })?;
                match entry.get_password() {
                    Ok(secret) => {
                        debug!(alias, "credential lookup in keychain: [REDACTED]");
                        Ok(Some(Credential::new(secret)))
                    }
                    Err(keyring::Error::NoEntry) => {
                        debug!(alias, "no credential stored in keychain");
                        Ok(None)
                    }
                    Err(error) => Err(KeystoreError::Keyring {
                        alias: alias.to_string(),
                        error: error.to_string(),
                    }),
                }
            }
        }
    }
}
