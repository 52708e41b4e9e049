//! Core identity, role and grant types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Role name that receives unconditional access (case-sensitive)
pub const ADMIN_ROLE_NAME: &str = "Admin";

/// Opaque module identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Authenticated user as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role_id: String,
    /// `false` means the account is disabled
    pub status: bool,
}

/// Role bound to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl Role {
    /// Whether this role carries admin bypass semantics
    pub fn is_admin_role(&self) -> bool {
        self.name == ADMIN_ROLE_NAME
    }
}

/// One module's access tuple for a role.
///
/// `can_write` is surfaced to consumers as "create", `can_read` as "view".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    #[serde(default)]
    pub id: String,
    pub module_id: ModuleId,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PermissionGrant {
    /// Create a grant with the four access flags
    pub fn new(
        module_id: impl Into<ModuleId>,
        can_read: bool,
        can_write: bool,
        can_edit: bool,
        can_delete: bool,
    ) -> Self {
        Self {
            id: String::new(),
            module_id: module_id.into(),
            can_read,
            can_write,
            can_edit,
            can_delete,
            created_at: None,
            updated_at: None,
        }
    }

    /// Read-only grant
    pub fn read_only(module_id: impl Into<ModuleId>) -> Self {
        Self::new(module_id, true, false, false, false)
    }

    /// Grant with every flag set
    pub fn full(module_id: impl Into<ModuleId>) -> Self {
        Self::new(module_id, true, true, true, true)
    }
}

/// Entry of the module catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub name: String,
}

impl ModuleDescriptor {
    pub fn new(id: impl Into<ModuleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Role as it appears inside the identity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(rename = "Permissions", default)]
    pub permissions: Vec<PermissionGrant>,
}

/// Identity endpoint response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPayload {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role_id: String,
    pub status: bool,
    #[serde(rename = "Role")]
    pub role: Option<RolePayload>,
}

/// Bearer credential held by a session
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Process-unique identity of an immutable value (snapshot or catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Generation(u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    /// Allocate a fresh generation
    pub fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_payload_wire_names() {
        let body = serde_json::json!({
            "id": "u-1",
            "name": "Dana",
            "email": "dana@example.com",
            "roleId": "r-1",
            "status": true,
            "Role": {
                "id": "r-1",
                "name": "Staff",
                "description": "front desk",
                "status": true,
                "Permissions": [
                    { "id": "p-1", "moduleId": "M1", "canRead": true, "canWrite": false,
                      "canEdit": false, "canDelete": false, "createdAt": "2024-01-01" }
                ]
            }
        });

        let payload: IdentityPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.role_id, "r-1");
        let role = payload.role.unwrap();
        assert_eq!(role.name, "Staff");
        assert_eq!(role.permissions.len(), 1);
        assert_eq!(role.permissions[0].module_id.as_str(), "M1");
        assert!(role.permissions[0].can_read);
        assert_eq!(role.permissions[0].created_at.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_admin_role_is_case_sensitive() {
        let mut role = Role {
            id: "r".into(),
            name: "Admin".into(),
            description: String::new(),
            status: true,
        };
        assert!(role.is_admin_role());
        role.name = "admin".into();
        assert!(!role.is_admin_role());
    }

    #[test]
    fn test_credential_debug_redacts() {
        let cred = Credential::new("secret-token");
        assert_eq!(format!("{:?}", cred), "Credential(<redacted>)");
        assert!(!cred.is_blank());
        assert!(Credential::new("  ").is_blank());
    }

    #[test]
    fn test_generations_are_unique() {
        let a = Generation::next();
        let b = Generation::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
