//! Catalog overlay loader
//!
//! Overlay files list error definitions and code lists that replace (or, with
//! `extend: true`, add to) the built-in ones:
//!
//! ```yaml
//! errors:
//!   - code: "204"
//!     message: "BAD VALUE [value]"
//! code_lists:
//!   - name: location
//!     extend: true
//!     codes: ["58"]
//! ```

use crate::codelist::CodeList;
use crate::errors::ErrorDefinition;
use crate::registry::CatalogRegistry;
use crate::{Catalog, Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    errors: Vec<ErrorFile>,
    #[serde(default)]
    code_lists: Vec<CodeListFile>,
}

#[derive(Debug, Deserialize)]
struct ErrorFile {
    code: String,
    message: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    warning: bool,
}

impl From<ErrorFile> for ErrorDefinition {
    fn from(file: ErrorFile) -> Self {
        Self {
            code: file.code,
            message: file.message,
            description: file.description,
            warning: file.warning,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CodeListFile {
    name: String,
    #[serde(default)]
    codes: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_case_sensitive")]
    case_sensitive: bool,
    /// Add the codes to the existing list instead of replacing it
    #[serde(default)]
    extend: bool,
}

fn default_case_sensitive() -> bool {
    true
}

/// Loads catalog overlays and caches the merged result per file
pub struct CatalogLoader {
    registry: Arc<CatalogRegistry>,
}

impl CatalogLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(CatalogRegistry::new()),
        }
    }

    /// Loader sharing an existing cache
    #[must_use]
    pub fn with_registry(registry: Arc<CatalogRegistry>) -> Self {
        Self { registry }
    }

    /// Load the overlay at `path` merged over the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::InvalidFormat`] when it does not parse.
    pub fn load(&self, path: &Path) -> Result<Arc<Catalog>> {
        let key = path.canonicalize()?;

        if let Some(cached) = self.registry.get(&key) {
            debug!("Cache hit for catalog: {}", key.display());
            return Ok(cached);
        }

        trace!("Cache miss for catalog: {}", key.display());
        let catalog = self.load_from_file(&key)?;
        info!(
            path = %key.display(),
            errors = catalog.errors.len(),
            code_lists = catalog.code_lists.list_names().len(),
            "Loaded catalog overlay"
        );
        Ok(self.registry.insert(key, catalog))
    }

    /// Load an overlay file without consulting the cache
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::InvalidFormat`].
    pub fn load_from_file(&self, path: &Path) -> Result<Catalog> {
        trace!("Loading catalog from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)
        } else {
            self.load_from_json(&content)
        }
    }

    /// Merge a JSON overlay over the built-in catalog
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on malformed input.
    pub fn load_from_json(&self, json: &str) -> Result<Catalog> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        Ok(Self::merge(Catalog::builtin(), file))
    }

    /// Merge a YAML overlay over the built-in catalog
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on malformed input.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<Catalog> {
        let file: CatalogFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        Ok(Self::merge(Catalog::builtin(), file))
    }

    fn merge(mut catalog: Catalog, file: CatalogFile) -> Catalog {
        for error in file.errors {
            trace!(code = %error.code, "overriding error definition");
            catalog.errors.insert(error.into());
        }

        for list_file in file.code_lists {
            let mut list = match (list_file.extend, catalog.code_lists.get(&list_file.name)) {
                (true, Some(existing)) => existing.clone(),
                _ => CodeList::new(list_file.name.clone()),
            };
            for code in list_file.codes {
                list.add(code);
            }
            list = list.case_sensitive(list_file.case_sensitive);
            if let Some(description) = list_file.description {
                list = list.with_description(description);
            }
            trace!(name = %list.name, codes = list.len(), "overriding code list");
            catalog.code_lists.register(list);
        }

        catalog
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}
