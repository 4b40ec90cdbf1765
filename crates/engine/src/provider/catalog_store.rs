use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use apiplan_types::Catalog;
use tracing::debug;

use super::{CatalogProvider, ProviderError};

/// Catalogs held in memory, keyed by alias.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    catalogs: HashMap<String, Catalog>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, alias: impl Into<String>, catalog: Catalog) -> Self {
        self.insert(alias, catalog);
        self
    }

    pub fn insert(&mut self, alias: impl Into<String>, catalog: Catalog) {
        self.catalogs.insert(alias.into(), catalog);
    }
}

impl CatalogProvider for InMemoryCatalogStore {
    fn catalog(&self, alias: &str) -> Result<Option<Catalog>, ProviderError> {
        Ok(self.catalogs.get(alias).cloned())
    }
}

/// Catalogs stored as `<root>/<alias>.json`.
///
/// The file is read on every lookup, so each run sees the catalog as it is on
/// disk when the run starts.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogStore {
    root: PathBuf,
}

impl DirectoryCatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the catalog file for `alias`.
    pub fn catalog_path(&self, alias: &str) -> Result<PathBuf, ProviderError> {
        let valid = !alias.is_empty()
            && alias != "."
            && alias != ".."
            && alias.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
        if !valid {
            return Err(ProviderError::InvalidAlias { alias: alias.to_string() });
        }
        Ok(self.root.join(format!("{alias}.json")))
    }
}

impl CatalogProvider for DirectoryCatalogStore {
    fn catalog(&self, alias: &str) -> Result<Option<Catalog>, ProviderError> {
        let path = self.catalog_path(alias)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(alias, path = %path.display(), "no catalog file for alias");
                return Ok(None);
            }
            Err(source) => {
                return Err(ProviderError::CatalogRead {
                    alias: alias.to_string(),
                    path,
                    source,
                });
            }
        };

        let catalog = Catalog::from_json_str(&content).map_err(|source| ProviderError::CatalogParse {
            alias: alias.to_string(),
            path: path.clone(),
            source,
        })?;
        debug!(
            alias,
            path = %path.display(),
            operations = catalog.operations.len(),
            "catalog loaded"
        );
        Ok(Some(catalog))
    }
}
