//! Staleness detection
//!
//! Infers from local state alone whether an authenticated session is running
//! on a missing or incomplete snapshot. This is a shape check, not an age
//! check, and it errs towards asking for a sync.

use serde::Serialize;

use crate::catalog::CatalogResolver;
use crate::snapshot::PermissionSnapshot;
use crate::types::Credential;

/// Local session state the detector looks at
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub credential: Option<&'a Credential>,
    pub snapshot: Option<&'a PermissionSnapshot>,
    pub catalog: &'a CatalogResolver,
}

/// Why a snapshot is considered stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StalenessReason {
    /// Credential present, no snapshot
    MissingSnapshot,
    /// Snapshot has an empty grant list
    NoGrants,
    /// No grant maps to an accessible catalog module
    NoAccessibleModules,
}

/// Diagnose staleness; `None` means the snapshot looks complete
pub fn assess(view: &SessionView<'_>) -> Option<StalenessReason> {
    // Anonymous sessions are unauthenticated, not stale.
    let credential = view.credential?;
    if credential.is_blank() {
        return None;
    }

    let Some(snapshot) = view.snapshot else {
        return Some(StalenessReason::MissingSnapshot);
    };

    if !snapshot.has_grants() {
        return Some(StalenessReason::NoGrants);
    }

    // A pending catalog is still loading; a loaded-empty or unavailable one
    // resolves nothing, so grants point nowhere.
    if view.catalog.is_settled() {
        let reachable = snapshot.grants().iter().any(|grant| {
            view.catalog.contains_id(&grant.module_id)
                && (grant.can_read || grant.can_write || grant.can_edit || grant.can_delete)
        });

        if !reachable {
            return Some(StalenessReason::NoAccessibleModules);
        }
    }

    None
}

/// Whether the session should resync
pub fn needs_sync(view: &SessionView<'_>) -> bool {
    assess(view).is_some()
}
