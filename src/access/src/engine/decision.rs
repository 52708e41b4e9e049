//! Per-module access decision

use serde::{Deserialize, Serialize};

use crate::types::PermissionGrant;

/// Access flags for one module, derived from a snapshot and the catalog
///
/// Decisions are plain values; they are recomputed, never mutated, when the
/// snapshot they came from is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDecision {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_create: bool,
    pub can_delete: bool,

    /// A grant (or admin bypass) backs this decision
    pub found: bool,

    /// Snapshot or catalog has not finished its first load
    pub is_loading: bool,
}

impl ModuleDecision {
    /// All flags false, not found
    pub const fn denied() -> Self {
        Self {
            can_view: false,
            can_edit: false,
            can_create: false,
            can_delete: false,
            found: false,
            is_loading: false,
        }
    }

    /// All flags true, found (admin bypass)
    pub const fn unrestricted() -> Self {
        Self {
            can_view: true,
            can_edit: true,
            can_create: true,
            can_delete: true,
            found: true,
            is_loading: false,
        }
    }

    /// Fail-closed placeholder while data is still loading
    pub const fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::denied()
        }
    }

    /// Map a grant onto decision flags: read -> view, write -> create.
    pub fn from_grant(grant: &PermissionGrant) -> Self {
        Self {
            can_view: grant.can_read,
            can_edit: grant.can_edit,
            can_create: grant.can_write,
            can_delete: grant.can_delete,
            found: true,
            is_loading: false,
        }
    }

    /// Whether any access flag is set
    pub fn any(&self) -> bool {
        self.can_view || self.can_edit || self.can_create || self.can_delete
    }
}

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// No snapshot is loaded
    NoSnapshot,
    /// The user account is disabled
    AccountDisabled,
    /// Role is "Admin" on an enabled account
    AdminBypass,
    /// A grant for the module was found
    Grant,
    /// The snapshot has no grant for the module
    NoGrant,
    /// A grant exists but the module is not in the catalog
    UnknownModule,
    /// Snapshot or catalog still loading
    Loading,
}
