//! Immutable permission snapshot
//!
//! A snapshot is the user's identity, role and ordered grant list as issued by
//! the backend at one point in time. It is never patched: a changed permission
//! set always arrives as a new snapshot with a new [`Generation`].

use chrono::{DateTime, Utc};

use crate::error::{AccessError, Result};
use crate::types::{Generation, IdentityPayload, ModuleId, PermissionGrant, Role, UserIdentity};

#[derive(Debug, Clone)]
pub struct PermissionSnapshot {
    generation: Generation,
    user: UserIdentity,
    role: Role,
    grants: Vec<PermissionGrant>,
    received_at: DateTime<Utc>,
}

impl PermissionSnapshot {
    /// Build a snapshot from its parts
    pub fn new(user: UserIdentity, role: Role, grants: Vec<PermissionGrant>) -> Self {
        Self {
            generation: Generation::next(),
            user,
            role,
            grants,
            received_at: Utc::now(),
        }
    }

    /// Validate an identity endpoint payload and build a snapshot from it
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` when the user id is blank or the role is
    /// missing or does not match `roleId`.
    pub fn from_payload(payload: IdentityPayload) -> Result<Self> {
        if payload.id.trim().is_empty() {
            return Err(AccessError::MalformedPayload("user id is empty".into()));
        }

        let role = payload
            .role
            .ok_or_else(|| AccessError::MalformedPayload("payload has no Role".into()))?;

        if role.id != payload.role_id {
            return Err(AccessError::MalformedPayload(format!(
                "roleId '{}' does not match Role.id '{}'",
                payload.role_id, role.id
            )));
        }

        let user = UserIdentity {
            id: payload.id,
            name: payload.name,
            email: payload.email,
            role_id: payload.role_id,
            status: payload.status,
        };

        let grants = role.permissions;
        let role = Role {
            id: role.id,
            name: role.name,
            description: role.description,
            status: role.status,
        };

        Ok(Self::new(user, role, grants))
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Grants in the order the backend sent them
    pub fn grants(&self) -> &[PermissionGrant] {
        &self.grants
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn has_grants(&self) -> bool {
        !self.grants.is_empty()
    }

    /// Whether the account is enabled
    pub fn is_enabled(&self) -> bool {
        self.user.status
    }

    /// Admin bypass applies: role named "Admin" on an enabled account
    pub fn is_admin(&self) -> bool {
        self.user.status && self.role.is_admin_role()
    }

    /// First grant for `module_id`; later duplicates are ignored
    pub fn grant_for(&self, module_id: &ModuleId) -> Option<&PermissionGrant> {
        self.grants.iter().find(|grant| &grant.module_id == module_id)
    }
}
