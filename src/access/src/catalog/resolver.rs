//! Catalog resolver over an immutable module list
//!
//! Name and id indexes are built once when the catalog is installed; every
//! lookup afterwards is a map probe with no side effects.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Generation, ModuleDescriptor, ModuleId};

/// Immutable module list with name and id indexes
#[derive(Debug)]
pub struct ModuleCatalog {
    generation: Generation,
    modules: Vec<ModuleDescriptor>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<ModuleId, usize>,
}

impl ModuleCatalog {
    /// Build a catalog. On duplicate names or ids the first entry wins.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Self {
        let mut by_name = HashMap::with_capacity(modules.len());
        let mut by_id = HashMap::with_capacity(modules.len());

        for (idx, module) in modules.iter().enumerate() {
            by_name.entry(module.name.clone()).or_insert(idx);
            by_id.entry(module.id.clone()).or_insert(idx);
        }

        Self {
            generation: Generation::next(),
            modules,
            by_name,
            by_id,
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }
}

/// Load state of the catalog behind a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    /// First load has not completed
    Pending,
    /// Catalog was fetched
    Loaded,
    /// Fetch failed; behaves as an empty catalog
    Unavailable { reason: String },
}

/// Resolves module names to ids and back
///
/// Cloning is cheap; the catalog is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: Arc<ModuleCatalog>,
    status: CatalogStatus,
}

impl CatalogResolver {
    /// Resolver for a catalog that has not been fetched yet
    pub fn pending() -> Self {
        Self {
            catalog: Arc::new(ModuleCatalog::empty()),
            status: CatalogStatus::Pending,
        }
    }

    /// Resolver over a fetched module list
    pub fn loaded(modules: Vec<ModuleDescriptor>) -> Self {
        Self {
            catalog: Arc::new(ModuleCatalog::new(modules)),
            status: CatalogStatus::Loaded,
        }
    }

    /// Resolver for a catalog whose fetch failed
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(ModuleCatalog::empty()),
            status: CatalogStatus::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Resolve a module name to its id
    pub fn resolve(&self, name: &str) -> Option<ModuleId> {
        self.catalog
            .by_name
            .get(name)
            .map(|&idx| self.catalog.modules[idx].id.clone())
    }

    /// Resolve a module id to its name
    pub fn resolve_name(&self, id: &ModuleId) -> Option<&str> {
        self.catalog
            .by_id
            .get(id)
            .map(|&idx| self.catalog.modules[idx].name.as_str())
    }

    /// Whether a module with this name exists
    pub fn exists(&self, name: &str) -> bool {
        self.catalog.by_name.contains_key(name)
    }

    /// Whether a module with this id exists
    pub fn contains_id(&self, id: &ModuleId) -> bool {
        self.catalog.by_id.contains_key(id)
    }

    /// Module names in catalog order
    pub fn list(&self) -> Vec<&str> {
        self.catalog.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Turn a caller-supplied name or id into a module id.
    ///
    /// Names win over ids. A key that is neither is returned verbatim; the
    /// evaluator then decides (admin bypass still applies to it).
    pub fn module_key(&self, name_or_id: &str) -> ModuleId {
        self.resolve(name_or_id)
            .unwrap_or_else(|| ModuleId::new(name_or_id))
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        self.catalog.modules()
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    /// First load finished, successfully or not
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, CatalogStatus::Pending)
    }

    pub fn generation(&self) -> Generation {
        self.catalog.generation()
    }

    pub fn len(&self) -> usize {
        self.catalog.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.modules.is_empty()
    }
}

impl Default for CatalogResolver {
    fn default() -> Self {
        Self::pending()
    }
}
