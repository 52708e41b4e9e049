//! Module catalog and name/id resolution
//!
//! The catalog is fetched once per session by an external collaborator and
//! handed to a [`CatalogResolver`], which is a pure lookup over it. An empty or
//! unavailable catalog resolves nothing, so dependent decisions fail closed.
//!
//! # Example
//!
//! ```
//! use adminkit_access::catalog::CatalogResolver;
//! use adminkit_access::types::ModuleDescriptor;
//!
//! let resolver = CatalogResolver::loaded(vec![
//!     ModuleDescriptor::new("6f1c", "Roles"),
//!     ModuleDescriptor::new("9a02", "Inventory"),
//! ]);
//!
//! assert_eq!(resolver.resolve("Roles").unwrap().as_str(), "6f1c");
//! assert!(resolver.exists("Inventory"));
//! assert!(resolver.resolve("Billing").is_none());
//! ```

mod resolver;

pub use resolver::{CatalogResolver, CatalogStatus, ModuleCatalog};
