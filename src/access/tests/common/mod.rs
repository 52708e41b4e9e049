//! Shared fixtures for session and sync tests

#![allow(dead_code)]

use adminkit_access::types::{IdentityPayload, ModuleDescriptor, PermissionGrant, RolePayload};
use adminkit_access::{AccessConfig, AccessError, AccessSession, CatalogSource, Credential, IdentitySource, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const TOKEN: &str = "token-1";

pub fn payload(role: &str, enabled: bool, grants: Vec<PermissionGrant>) -> IdentityPayload {
    IdentityPayload {
        id: "u-1".into(),
        name: "Dana".into(),
        email: Some("dana@example.com".into()),
        role_id: "r-1".into(),
        status: enabled,
        role: Some(RolePayload {
            id: "r-1".into(),
            name: role.into(),
            description: String::new(),
            status: true,
            permissions: grants,
        }),
    }
}

pub fn modules() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("M1", "Roles"),
        ModuleDescriptor::new("M2", "Inventory"),
        ModuleDescriptor::new("M3", "Reports"),
    ]
}

/// Identity and catalog source with scripted replies, call counting and an
/// optional gate that holds identity fetches in flight until released.
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Result<IdentityPayload>>>,
    default_reply: Mutex<IdentityPayload>,
    modules: Mutex<Option<Vec<ModuleDescriptor>>>,
    identity_calls: AtomicUsize,
    catalog_calls: AtomicUsize,
    gated: AtomicBool,
    gate: Notify,
}

impl ScriptedSource {
    pub fn new(default_reply: IdentityPayload) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: Mutex::new(default_reply),
            modules: Mutex::new(Some(modules())),
            identity_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            gate: Notify::new(),
        })
    }

    /// Queue a one-off reply ahead of the default
    pub fn push_reply(&self, reply: Result<IdentityPayload>) {
        self.replies.lock().push_back(reply);
    }

    pub fn set_default(&self, reply: IdentityPayload) {
        *self.default_reply.lock() = reply;
    }

    pub fn set_modules(&self, modules: Option<Vec<ModuleDescriptor>>) {
        *self.modules.lock() = modules;
    }

    /// Hold identity fetches until [`release`](Self::release)
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let one held fetch finish
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Stop holding new fetches
    pub fn open(&self) {
        self.gated.store(false, Ordering::SeqCst);
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    /// Yield until `n` identity fetches have started
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1_000 {
            if self.identity_calls() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} identity fetches, saw {}", n, self.identity_calls());
    }
}

#[async_trait]
impl IdentitySource for ScriptedSource {
    async fn fetch_identity(&self, _credential: &Credential) -> Result<IdentityPayload> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);

        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        let queued = self.replies.lock().pop_front();
        match queued {
            Some(reply) => reply,
            None => Ok(self.default_reply.lock().clone()),
        }
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_modules(&self, _credential: &Credential) -> Result<Vec<ModuleDescriptor>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);

        self.modules
            .lock()
            .clone()
            .ok_or_else(|| AccessError::CatalogUnavailable("503 Service Unavailable".into()))
    }
}

pub fn session(source: &Arc<ScriptedSource>) -> AccessSession {
    AccessSession::new(&AccessConfig::default(), source.clone(), source.clone())
}

/// Signed-in session with catalog loaded and one successful sync
pub async fn ready_session(source: &Arc<ScriptedSource>) -> AccessSession {
    let session = session(source);
    session.sign_in(Credential::new(TOKEN));
    assert!(session.bootstrap().await, "bootstrap sync should succeed");
    session
}

/// Yield until `condition` holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
