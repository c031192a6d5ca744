//! Synchronization pass driver
//!
//! Owns all mutable sync state behind one mutex. A pass loads the catalog,
//! syncs every view in catalog order, prunes items no view refers to, then
//! publishes a fresh library snapshot.
//! Readers only ever see complete snapshots.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::item_store::ItemStore;
use super::projector::LibraryProjector;
use super::upstream::Upstream;
use super::view_catalog::ViewCatalog;
use super::view_sync::ViewSynchronizer;
use crate::error::SyncError;
use crate::models::{Library, PassReport, ViewOutcome};

struct SyncState {
    catalog: ViewCatalog,
    store: ItemStore,
}

/// Pass driver and library snapshot holder
pub struct SyncEngine {
    upstream: Arc<dyn Upstream>,
    synchronizer: ViewSynchronizer,
    projector: LibraryProjector,
    state: Mutex<SyncState>,
    library: RwLock<Arc<Library>>,
    last_error: RwLock<Option<String>>,
    last_pass_at: RwLock<Option<DateTime<Utc>>>,
}

impl SyncEngine {
    pub fn new(upstream: Arc<dyn Upstream>, catalog: ViewCatalog, projector: LibraryProjector) -> Self {
        Self {
            synchronizer: ViewSynchronizer::new(Arc::clone(&upstream)),
            upstream,
            projector,
            state: Mutex::new(SyncState {
                catalog,
                store: ItemStore::new(),
            }),
            library: RwLock::new(Arc::new(Library::default())),
            last_error: RwLock::new(None),
            last_pass_at: RwLock::new(None),
        }
    }

    pub fn upstream(&self) -> &Arc<dyn Upstream> {
        &self.upstream
    }

    /// Latest published library
    pub async fn library(&self) -> Arc<Library> {
        Arc::clone(&*self.library.read().await)
    }

    /// Last pass or view failure, if any
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Completion time of the last pass that reached the end
    pub async fn last_pass_at(&self) -> Option<DateTime<Utc>> {
        *self.last_pass_at.read().await
    }

    /// Run one synchronization pass
    ///
    /// Fails fast with [`SyncError::PassInProgress`] while another pass runs.
    /// Upstream failures abort the pass; ordering and criteria failures abort
    /// only their view and are reported in the returned [`PassReport`].
    pub async fn run_pass(&self) -> Result<PassReport, SyncError> {
        let mut guard = self.state.try_lock().map_err(|_| SyncError::PassInProgress)?;

        match self.pass(&mut guard).await {
            Ok(report) => {
                let failures: Vec<String> = report
                    .failures()
                    .filter_map(|v| v.result.as_ref().err().map(|e| e.to_string()))
                    .collect();
                *self.last_error.write().await = failures.last().cloned();
                *self.last_pass_at.write().await = Some(report.finished_at);
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Synchronization pass aborted");
                *self.last_error.write().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn pass(&self, state: &mut SyncState) -> Result<PassReport, SyncError> {
        let started_at = Utc::now();
        let SyncState { catalog, store } = state;

        let load = catalog.load(self.upstream.as_ref()).await?;
        for key in &load.dropped {
            store.remove_view(key);
        }
        store.begin_pass();

        let mut views = Vec::with_capacity(catalog.views().len());
        for view in catalog.views() {
            let result = match self.synchronizer.sync_view(view, store).await {
                Err(e) if !e.is_view_local() => return Err(e),
                Err(e) => {
                    warn!(view = %view.key, error = %e, "View update aborted, keeping previous membership");
                    Err(e)
                }
                ok => ok,
            };

            views.push(ViewOutcome {
                view_key: view.key.clone(),
                display_name: view.display_name.clone(),
                result,
            });
        }

        let pruned = store.prune(catalog.views());

        let library = self.projector.project(catalog.views(), store);
        let item_count = library.item_count();
        *self.library.write().await = Arc::new(library);

        let report = PassReport {
            started_at,
            finished_at: Utc::now(),
            catalog: load,
            views,
            pruned,
        };

        info!(
            views = report.views.len(),
            failed = report.failures().count(),
            items = store.item_count(),
            pruned = report.pruned,
            members = item_count,
            "Synchronization pass complete"
        );

        Ok(report)
    }

    /// Run a pass every `period` until the task is aborted
    ///
    /// The first tick is skipped; callers run the initial pass themselves.
    pub fn spawn_interval(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match engine.run_pass().await {
                    Ok(_) => {}
                    Err(SyncError::PassInProgress) => {
                        info!("Skipping scheduled pass, another pass is running");
                    }
                    // Already logged by run_pass
                    Err(_) => {}
                }
            }
        })
    }
}
