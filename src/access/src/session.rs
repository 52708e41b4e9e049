//! Access session
//!
//! One [`AccessSession`] per signed-in user, constructed explicitly and passed
//! to whoever needs decisions. It owns the credential, the current snapshot,
//! the module catalog, the decision memo and the synchronizer; nothing here is
//! process-global, so independent sessions can run side by side.
//!
//! # Example
//!
//! ```rust
//! use adminkit_access::{AccessConfig, AccessSession, Credential, InMemoryDirectory};
//! use adminkit_access::types::{IdentityPayload, ModuleDescriptor, PermissionGrant, RolePayload};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let directory = Arc::new(InMemoryDirectory::new());
//! directory.set_modules(vec![ModuleDescriptor::new("M1", "Inventory")]).await;
//! directory
//!     .put_identity("token-1", IdentityPayload {
//!         id: "u-1".into(),
//!         name: "Dana".into(),
//!         email: None,
//!         role_id: "r-1".into(),
//!         status: true,
//!         role: Some(RolePayload {
//!             id: "r-1".into(),
//!             name: "Staff".into(),
//!             description: String::new(),
//!             status: true,
//!             permissions: vec![PermissionGrant::read_only("M1")],
//!         }),
//!     })
//!     .await;
//!
//! let session = AccessSession::new(&AccessConfig::default(), directory.clone(), directory);
//! session.sign_in(Credential::new("token-1"));
//! assert!(session.bootstrap().await);
//!
//! let decision = session.decide("Inventory");
//! assert!(decision.can_view && !decision.can_create);
//! # }
//! ```

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogResolver, CatalogStatus};
use crate::config::AccessConfig;
use crate::engine::{AccessMetrics, CacheStats, DecisionBasis, DecisionInputs, DecisionView, MetricsCollector, ModuleDecision};
use crate::error::AccessError;
use crate::snapshot::PermissionSnapshot;
use crate::source::{CatalogSource, IdentitySource};
use crate::staleness::{self, SessionView, StalenessReason};
use crate::sync::{SyncDiagnostics, SyncState, Synchronizer};
use crate::types::{Credential, IdentityPayload, ModuleDescriptor};

/// Mutable session state; every write swaps whole values
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) credential: Option<Credential>,
    pub(crate) snapshot: Option<Arc<PermissionSnapshot>>,
    pub(crate) catalog: CatalogResolver,

    /// Bumped on logout, eviction and sign-in; in-flight work from an older
    /// epoch is discarded.
    pub(crate) epoch: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            credential: None,
            snapshot: None,
            catalog: CatalogResolver::pending(),
            epoch: 0,
        }
    }

    /// Drop credential, snapshot and catalog and start a new epoch
    pub(crate) fn evict(&mut self) {
        self.credential = None;
        self.snapshot = None;
        self.catalog = CatalogResolver::pending();
        self.epoch += 1;
    }
}

/// Per-user permission session
pub struct AccessSession {
    state: Arc<RwLock<SessionState>>,
    catalog_source: Arc<dyn CatalogSource>,
    view: DecisionView,
    synchronizer: Synchronizer,
    metrics: Option<Arc<MetricsCollector>>,
    diagnostics: Arc<SyncDiagnostics>,
}

impl AccessSession {
    /// Create an anonymous session over the given sources
    pub fn new(
        config: &AccessConfig,
        identity_source: Arc<dyn IdentitySource>,
        catalog_source: Arc<dyn CatalogSource>,
    ) -> Self {
        let state = Arc::new(RwLock::new(SessionState::new()));
        let metrics = config
            .metrics
            .enabled
            .then(|| Arc::new(MetricsCollector::new()));
        let diagnostics = Arc::new(SyncDiagnostics::new(config.diagnostics.capacity));

        let synchronizer = Synchronizer::new(
            identity_source,
            Arc::clone(&state),
            Arc::clone(&diagnostics),
            metrics.clone(),
        );

        Self {
            state,
            catalog_source,
            view: DecisionView::new(config.cache.clone(), metrics.clone()),
            synchronizer,
            metrics,
            diagnostics,
        }
    }

    /// Session backed by the HTTP identity and catalog endpoints
    #[cfg(feature = "http")]
    pub fn connect(config: &AccessConfig) -> crate::error::Result<Self> {
        let backend = Arc::new(crate::source::HttpBackend::new(&config.backend)?);
        Ok(Self::new(config, backend.clone(), backend))
    }

    /// Install a credential. A different credential starts a new session
    /// epoch: snapshot and catalog are dropped and in-flight work discarded.
    pub fn sign_in(&self, credential: Credential) {
        let mut state = self.state.write();
        if state.credential.as_ref() == Some(&credential) {
            return;
        }

        state.evict();
        state.credential = Some(credential);
        let epoch = state.epoch;
        drop(state);

        self.view.invalidate();
        info!(epoch, "credential installed");
    }

    /// Tear the session down; a sync still in flight will be discarded
    pub fn logout(&self) {
        let mut state = self.state.write();
        state.evict();
        let epoch = state.epoch;
        drop(state);

        self.view.invalidate();
        info!(epoch, "session logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .credential
            .as_ref()
            .is_some_and(|c| !c.is_blank())
    }

    /// Fetch the module catalog. On failure the resolver is marked
    /// unavailable and resolves nothing; returns whether the fetch succeeded.
    pub async fn load_catalog(&self) -> bool {
        let (credential, epoch) = {
            let state = self.state.read();
            (state.credential.clone(), state.epoch)
        };

        let Some(credential) = credential.filter(|c| !c.is_blank()) else {
            debug!("catalog load skipped: no credential");
            return false;
        };

        let fetched = self.catalog_source.fetch_modules(&credential).await;

        let mut state = self.state.write();
        if state.epoch != epoch {
            debug!(epoch, "session changed during catalog load, result discarded");
            return false;
        }

        match fetched {
            Ok(modules) => {
                let count = modules.len();
                state.catalog = CatalogResolver::loaded(modules);
                drop(state);
                info!(modules = count, "module catalog loaded");
                true
            }
            Err(err) if err.is_credential_rejected() => {
                state.evict();
                drop(state);
                self.view.invalidate();
                warn!(error = %err, "credential rejected while loading catalog, session torn down");
                false
            }
            Err(err) => {
                let err = match err {
                    AccessError::CatalogUnavailable(_) => err,
                    other => AccessError::CatalogUnavailable(other.to_string()),
                };
                state.catalog = CatalogResolver::unavailable(err.to_string());
                drop(state);
                warn!(error = %err, "module catalog unavailable, decisions fail closed");
                false
            }
        }
    }

    /// Install a catalog fetched by an external collaborator
    pub fn install_catalog(&self, modules: Vec<ModuleDescriptor>) {
        self.state.write().catalog = CatalogResolver::loaded(modules);
    }

    /// Load the catalog unless this session already has one, then sync the
    /// snapshot; returns the sync result. A failed catalog load is retried.
    pub async fn bootstrap(&self) -> bool {
        let loaded = matches!(self.state.read().catalog.status(), CatalogStatus::Loaded);
        if loaded {
            debug!("catalog already loaded for this session");
        } else {
            self.load_catalog().await;
        }

        self.force_sync().await
    }

    /// Decision for a module given by name or id
    pub fn decide(&self, name_or_id: &str) -> ModuleDecision {
        let (snapshot, catalog, authenticated) = self.read_inputs();
        let inputs = DecisionInputs {
            snapshot: snapshot.as_deref(),
            catalog: &catalog,
            authenticated,
        };
        self.view.decide(&inputs, name_or_id)
    }

    /// Decision plus the rule that produced it, computed fresh
    pub fn explain(&self, name_or_id: &str) -> (ModuleDecision, DecisionBasis) {
        let (snapshot, catalog, authenticated) = self.read_inputs();
        let inputs = DecisionInputs {
            snapshot: snapshot.as_deref(),
            catalog: &catalog,
            authenticated,
        };
        self.view.explain(&inputs, name_or_id)
    }

    /// Decision for every catalog module, in catalog order
    pub fn decide_all(&self) -> Vec<(ModuleDescriptor, ModuleDecision)> {
        let (snapshot, catalog, authenticated) = self.read_inputs();
        let inputs = DecisionInputs {
            snapshot: snapshot.as_deref(),
            catalog: &catalog,
            authenticated,
        };
        self.view.decide_all(&inputs)
    }

    /// Admin bypass applies to this session
    pub fn is_admin(&self) -> bool {
        crate::engine::is_admin(self.state.read().snapshot.as_deref())
    }

    /// Whether the snapshot looks missing or incomplete
    pub fn needs_sync(&self) -> bool {
        self.staleness().is_some()
    }

    pub fn staleness(&self) -> Option<StalenessReason> {
        let state = self.state.read();
        staleness::assess(&SessionView {
            credential: state.credential.as_ref(),
            snapshot: state.snapshot.as_deref(),
            catalog: &state.catalog,
        })
    }

    /// Refresh the snapshot from the identity source (single-flight)
    pub async fn force_sync(&self) -> bool {
        self.synchronizer.force_sync().await
    }

    /// Install a snapshot obtained out of band, e.g. from a login response.
    /// Ignored for anonymous sessions; malformed payloads leave the current
    /// snapshot in place.
    pub fn apply_snapshot(&self, payload: IdentityPayload) -> bool {
        let snapshot = match PermissionSnapshot::from_payload(payload) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "rejected out-of-band snapshot");
                return false;
            }
        };

        let mut state = self.state.write();
        if !state.credential.as_ref().is_some_and(|c| !c.is_blank()) {
            debug!("out-of-band snapshot ignored: no credential");
            return false;
        }

        state.snapshot = Some(Arc::new(snapshot));
        true
    }

    pub fn snapshot(&self) -> Option<Arc<PermissionSnapshot>> {
        self.state.read().snapshot.clone()
    }

    pub fn resolver(&self) -> CatalogResolver {
        self.state.read().catalog.clone()
    }

    pub fn sync_state(&self) -> SyncState {
        self.synchronizer.state()
    }

    pub fn metrics(&self) -> Option<AccessMetrics> {
        self.metrics.as_ref().map(|m| m.get_metrics())
    }

    /// Prometheus text for this session's counters
    pub fn export_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(|m| m.export_prometheus())
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.view.cache_stats()
    }

    pub fn diagnostics(&self) -> &SyncDiagnostics {
        &self.diagnostics
    }

    fn read_inputs(&self) -> (Option<Arc<PermissionSnapshot>>, CatalogResolver, bool) {
        let state = self.state.read();
        let authenticated = state.credential.as_ref().is_some_and(|c| !c.is_blank());
        (state.snapshot.clone(), state.catalog.clone(), authenticated)
    }
}
