//! Permission evaluator
//!
//! Pure functions from a snapshot and a module id to a total decision. Every
//! branch returns a complete value; missing data never raises.

use super::decision::{DecisionBasis, ModuleDecision};
use crate::snapshot::PermissionSnapshot;
use crate::types::ModuleId;

/// Decide access to `module_id` under `snapshot`.
///
/// Order: no snapshot, disabled account, admin bypass, first matching grant.
pub fn decide(snapshot: Option<&PermissionSnapshot>, module_id: &ModuleId) -> ModuleDecision {
    evaluate(snapshot, module_id).0
}

/// Same as [`decide`], also reporting which rule applied
pub fn evaluate(
    snapshot: Option<&PermissionSnapshot>,
    module_id: &ModuleId,
) -> (ModuleDecision, DecisionBasis) {
    let Some(snapshot) = snapshot else {
        return (ModuleDecision::denied(), DecisionBasis::NoSnapshot);
    };

    // Disabled overrides admin.
    if !snapshot.is_enabled() {
        return (ModuleDecision::denied(), DecisionBasis::AccountDisabled);
    }

    if snapshot.role().is_admin_role() {
        return (ModuleDecision::unrestricted(), DecisionBasis::AdminBypass);
    }

    match snapshot.grant_for(module_id) {
        Some(grant) => (ModuleDecision::from_grant(grant), DecisionBasis::Grant),
        None => (ModuleDecision::denied(), DecisionBasis::NoGrant),
    }
}

/// Admin bypass applies, independent of any module
pub fn is_admin(snapshot: Option<&PermissionSnapshot>) -> bool {
    snapshot.is_some_and(PermissionSnapshot::is_admin)
}
