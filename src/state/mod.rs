pub mod sync;

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};

use crate::{
    config::AppConfig, dao::curator_store::CuratorStore, error::ServiceError,
    remote::CuratorSource,
};

pub use self::sync::SyncStatus;

/// Handle shared by the router, the scheduler and the supervisor.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle, the remote source and the sync bookkeeping.
pub struct AppState {
    curator_store: RwLock<Option<Arc<dyn CuratorStore>>>,
    source: Arc<dyn CuratorSource>,
    config: AppConfig,
    admin_token: Option<String>,
    degraded: watch::Sender<bool>,
    sync_gate: Arc<Mutex<()>>,
    sync_status: watch::Sender<SyncStatus>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn CuratorSource>,
        admin_token: Option<String>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (sync_status_tx, _rx) = watch::channel(SyncStatus::default());
        Arc::new(Self {
            curator_store: RwLock::new(None),
            source,
            config,
            admin_token: admin_token.filter(|token| !token.is_empty()),
            degraded: degraded_tx,
            sync_gate: Arc::new(Mutex::new(())),
            sync_status: sync_status_tx,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn curator_store(&self) -> Option<Arc<dyn CuratorStore>> {
        let guard = self.curator_store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_curator_store(&self) -> Result<Arc<dyn CuratorStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.curator_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_curator_store(&self, store: Arc<dyn CuratorStore>) {
        {
            let mut guard = self.curator_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Remote catalog the synchronizer reads from.
    pub fn source(&self) -> Arc<dyn CuratorSource> {
        self.source.clone()
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token expected in the `X-Admin-Token` header, admin routes are locked when unset.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Claim the single sync slot; `None` while another pass holds it.
    pub fn try_begin_sync(&self) -> Option<OwnedMutexGuard<()>> {
        self.sync_gate.clone().try_lock_owned().ok()
    }

    /// Snapshot of the synchronizer status.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status.borrow().clone()
    }

    /// Mutate the synchronizer status in place and notify watchers.
    pub fn update_sync_status(&self, update: impl FnOnce(&mut SyncStatus)) {
        self.sync_status.send_modify(update);
    }
}
