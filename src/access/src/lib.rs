//! # AdminKit Access
//!
//! Permission resolution and synchronization for the admin console.
//!
//! Turns the role and grants the backend issues for a user into per-module
//! access decisions, notices when that data is missing or incomplete, and
//! refreshes it with a single, coalesced request.
//!
//! ## Features
//!
//! - **Immutable snapshots** replaced whole, never patched
//! - **Admin bypass** and disabled-account lockout
//! - **Catalog resolution** of module names to ids and back
//! - **Memoized decisions** keyed by snapshot/catalog generation
//! - **Staleness heuristic** computed from local state only
//! - **Single-flight sync** with discard of results for torn-down sessions
//!
//! ## Example
//!
//! ```rust
//! use adminkit_access::{decide, ModuleDecision, PermissionSnapshot};
//! use adminkit_access::types::{ModuleId, PermissionGrant, Role, UserIdentity};
//!
//! let snapshot = PermissionSnapshot::new(
//!     UserIdentity {
//!         id: "u-1".into(),
//!         name: "Dana".into(),
//!         email: None,
//!         role_id: "r-1".into(),
//!         status: true,
//!     },
//!     Role { id: "r-1".into(), name: "Staff".into(), description: String::new(), status: true },
//!     vec![PermissionGrant::read_only("M1")],
//! );
//!
//! let decision = decide(Some(&snapshot), &ModuleId::new("M1"));
//! assert!(decision.can_view && decision.found);
//! assert_eq!(decide(Some(&snapshot), &ModuleId::new("M2")), ModuleDecision::denied());
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod staleness;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogResolver, CatalogStatus};
pub use config::AccessConfig;
pub use engine::{decide, is_admin, DecisionBasis, DecisionView, ModuleDecision};
pub use error::{AccessError, FailureKind, Result};
pub use session::AccessSession;
pub use snapshot::PermissionSnapshot;
pub use source::{CatalogSource, IdentitySource, InMemoryDirectory};
pub use staleness::{needs_sync, StalenessReason};
pub use sync::{SyncOutcome, SyncState};
pub use types::{Credential, ModuleDescriptor, ModuleId};

#[cfg(feature = "http")]
pub use source::HttpBackend;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
