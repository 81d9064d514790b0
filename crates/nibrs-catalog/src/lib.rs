#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nibrs-catalog
//!
//! Externally supplied reference data for NIBRS validation: the error-code
//! catalog (message, description and severity per code) and the code lists
//! that coded fields are checked against.
//!
//! Built-in defaults cover every code the decoder and rule factories emit.
//! Agencies can overlay them from a YAML or JSON file via [`CatalogLoader`],
//! which caches merged catalogs per path.

/// Named valid-value sets
pub mod codelist;
/// Error-code definitions
pub mod errors;
/// YAML/JSON overlay loading
pub mod loader;
/// Concurrent catalog cache
pub mod registry;

pub use codelist::{CodeList, CodeListRegistry};
pub use errors::{ErrorCatalog, ErrorDefinition};
pub use loader::CatalogLoader;
pub use registry::CatalogRegistry;

use thiserror::Error;

/// Errors raised while loading or querying a catalog
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown code list: {0}")]
    UnknownCodeList(String),

    #[error("Invalid catalog format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error catalog plus code lists, as consumed by the validator and formatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub errors: ErrorCatalog,
    pub code_lists: CodeListRegistry,
}

impl Catalog {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            errors: ErrorCatalog::builtin(),
            code_lists: CodeListRegistry::builtin(),
        }
    }

    /// Code list by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCodeList`] when no list of that name is registered.
    pub fn code_list(&self, name: &str) -> Result<&CodeList> {
        self.code_lists
            .get(name)
            .ok_or_else(|| Error::UnknownCodeList(name.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_list_lookup() {
        let catalog = Catalog::builtin();
        assert!(catalog.code_list(codelist::names::RACE).is_ok());
        let err = catalog.code_list("colour").unwrap_err();
        assert_eq!(err.to_string(), "Unknown code list: colour");
    }
}
