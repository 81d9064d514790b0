//! Concurrent cache of loaded catalogs

use crate::Catalog;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Thread-safe catalog cache keyed by canonical file path
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: DashMap<PathBuf, Arc<Catalog>>,
}

impl CatalogRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached catalog for `path`, shared rather than cloned
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Arc<Catalog>> {
        self.catalogs.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Cache `catalog` under `path` and hand back the shared handle.
    pub fn insert(&self, path: impl Into<PathBuf>, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        self.catalogs.insert(path.into(), Arc::clone(&catalog));
        catalog
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.catalogs.contains_key(path)
    }

    pub fn clear(&self) {
        self.catalogs.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
