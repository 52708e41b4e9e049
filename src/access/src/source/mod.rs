//! Authoritative data sources consumed by a session
//!
//! The identity source returns the user's role and grants; the catalog source
//! returns the module list. Both are external collaborators: the HTTP backend
//! talks to the real API, the in-memory directory serves fixed data.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AccessError, Result};
use crate::types::{Credential, IdentityPayload, ModuleDescriptor};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpBackend;

/// Source of the authoritative identity/permission payload
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetch the identity for `credential`.
    ///
    /// Must return `CredentialRejected` when the backend refuses the
    /// credential, so the session can evict it.
    async fn fetch_identity(&self, credential: &Credential) -> Result<IdentityPayload>;
}

/// Source of the module catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_modules(&self, credential: &Credential) -> Result<Vec<ModuleDescriptor>>;
}

/// In-memory identity and catalog source
///
/// Identities are keyed by token; an unknown token is rejected like an
/// expired one would be by a real backend.
pub struct InMemoryDirectory {
    identities: Arc<RwLock<HashMap<String, IdentityPayload>>>,
    modules: Arc<RwLock<Option<Vec<ModuleDescriptor>>>>,
    identity_fetches: AtomicUsize,
    catalog_fetches: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            identities: Arc::new(RwLock::new(HashMap::new())),
            modules: Arc::new(RwLock::new(Some(Vec::new()))),
            identity_fetches: AtomicUsize::new(0),
            catalog_fetches: AtomicUsize::new(0),
        }
    }

    /// Register (or replace) the identity served for `token`
    pub async fn put_identity(&self, token: impl Into<String>, payload: IdentityPayload) {
        self.identities.write().await.insert(token.into(), payload);
    }

    /// Stop accepting `token`
    pub async fn revoke(&self, token: &str) {
        self.identities.write().await.remove(token);
    }

    pub async fn set_modules(&self, modules: Vec<ModuleDescriptor>) {
        *self.modules.write().await = Some(modules);
    }

    /// Make catalog fetches fail
    pub async fn take_catalog_offline(&self) {
        *self.modules.write().await = None;
    }

    pub fn identity_fetches(&self) -> usize {
        self.identity_fetches.load(Ordering::SeqCst)
    }

    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentitySource for InMemoryDirectory {
    async fn fetch_identity(&self, credential: &Credential) -> Result<IdentityPayload> {
        self.identity_fetches.fetch_add(1, Ordering::SeqCst);

        let identities = self.identities.read().await;
        identities
            .get(credential.token())
            .cloned()
            .ok_or_else(|| AccessError::CredentialRejected("unknown token".into()))
    }
}

#[async_trait]
impl CatalogSource for InMemoryDirectory {
    async fn fetch_modules(&self, credential: &Credential) -> Result<Vec<ModuleDescriptor>> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);

        if !self.identities.read().await.contains_key(credential.token()) {
            return Err(AccessError::CredentialRejected("unknown token".into()));
        }

        self.modules
            .read()
            .await
            .clone()
            .ok_or_else(|| AccessError::CatalogUnavailable("catalog offline".into()))
    }
}
