//! Live projection fed by the store's change stream.
//!
//! [`ProjectionStore::initialize`] subscribes to the store first and then
//! loads every rank bucket and location record, so no change committed
//! during the load is missed. A background task applies each change and
//! publishes a [`ProjectionUpdate`] only when some mob's projected fields
//! actually moved. If the task falls behind the change stream it reloads
//! everything from the store and diffs the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use hunt_core::MobCatalog;
use hunt_db::DocumentStore;
use hunt_types::{
    ChangeEvent, Collection, MaintenanceWindow, MobId, MobLocationState, MobStatusDocument, Rank,
};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::AbortHandle;

use crate::error::ProjectionError;
use crate::projection::{MobRecord, Projection};
use crate::view::MobView;

/// Capacity of the update channel.
///
/// Subscribers that fall further behind receive
/// [`broadcast::error::RecvError::Lagged`] and should re-read the views.
const UPDATE_CAPACITY: usize = 256;

/// Notification that some mobs' projected fields changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionUpdate {
    /// Increases by one with every published update.
    pub revision: u64,
    /// Mobs whose fields changed.
    pub changed: Vec<MobId>,
}

/// Shared, continuously updated projection.
#[derive(Debug, Clone)]
pub struct ProjectionStore {
    projection: Arc<RwLock<Projection>>,
    updates: broadcast::Sender<ProjectionUpdate>,
    revision: Arc<AtomicU64>,
    task: AbortHandle,
}

impl ProjectionStore {
    /// Load the current state from `store` and start following its
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails.
    pub async fn initialize<S: DocumentStore>(
        store: &S,
        catalog: Arc<MobCatalog>,
    ) -> Result<Self, ProjectionError> {
        let changes = store.subscribe();
        let loaded = load(store, Arc::clone(&catalog)).await?;
        tracing::info!(mobs = loaded.len(), "Projection loaded");

        let projection = Arc::new(RwLock::new(loaded));
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let revision = Arc::new(AtomicU64::new(0));

        let follower = Follower {
            store: store.clone(),
            projection: Arc::clone(&projection),
            updates: updates.clone(),
            revision: Arc::clone(&revision),
        };
        let task = tokio::spawn(follower.run(changes)).abort_handle();

        Ok(Self {
            projection,
            updates,
            revision,
            task,
        })
    }

    /// Stop following the store. The last merged state stays readable.
    pub fn teardown(&self) {
        self.task.abort();
        tracing::info!("Projection stopped");
    }

    /// Whether the background task has stopped.
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectionUpdate> {
        self.updates.subscribe()
    }

    /// Number of updates published so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Merged record of one mob.
    pub async fn record(&self, mob_id: &MobId) -> Option<MobRecord> {
        self.projection.read().await.get(mob_id).cloned()
    }

    /// View of one mob at `now`.
    pub async fn view(
        &self,
        mob_id: &MobId,
        maintenance: Option<&MaintenanceWindow>,
        now: DateTime<Utc>,
    ) -> Option<MobView> {
        let projection = self.projection.read().await;
        projection
            .get(mob_id)
            .map(|record| MobView::build(record, maintenance, now))
    }

    /// Views of every mob at `now`, in mob id order.
    pub async fn views(
        &self,
        maintenance: Option<&MaintenanceWindow>,
        now: DateTime<Utc>,
    ) -> Vec<MobView> {
        let projection = self.projection.read().await;
        projection
            .iter()
            .map(|record| MobView::build(record, maintenance, now))
            .collect()
    }
}

/// Background half of a [`ProjectionStore`].
struct Follower<S> {
    store: S,
    projection: Arc<RwLock<Projection>>,
    updates: broadcast::Sender<ProjectionUpdate>,
    revision: Arc<AtomicU64>,
}

impl<S: DocumentStore> Follower<S> {
    async fn run(self, mut changes: broadcast::Receiver<ChangeEvent>) {
        loop {
            match changes.recv().await {
                Ok(event) => self.apply(&event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Projection lagged behind the store; reloading");
                    self.resync().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Change stream closed");
                    break;
                }
            }
        }
    }

    async fn apply(&self, event: &ChangeEvent) {
        let result = self.projection.write().await.apply(event);
        match result {
            Ok(changed) => self.publish(changed),
            Err(e) => tracing::warn!(error = %e, "Skipping change"),
        }
    }

    async fn resync(&self) {
        let catalog = Arc::clone(self.projection.read().await.catalog());
        match load(&self.store, catalog).await {
            Ok(fresh) => {
                let changed = self.projection.write().await.replace_from(fresh);
                self.publish(changed);
            }
            Err(e) => tracing::warn!(error = %e, "Projection reload failed"),
        }
    }

    fn publish(&self, changed: Vec<MobId>) {
        if changed.is_empty() {
            return;
        }
        let revision = self.revision.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        let count = changed.len();
        // send fails only when nobody is subscribed.
        let receivers = self
            .updates
            .send(ProjectionUpdate { revision, changed })
            .unwrap_or(0);
        tracing::debug!(revision, changed = count, receivers, "Projection updated");
    }
}

/// Build a projection from the current contents of `store`.
async fn load<S: DocumentStore>(
    store: &S,
    catalog: Arc<MobCatalog>,
) -> Result<Projection, ProjectionError> {
    let mut projection = Projection::new(catalog);

    for rank in Rank::ALL {
        let bucket: Option<MobStatusDocument> = store
            .get(Collection::MobStatus, rank.status_document())
            .await?;
        projection.merge_bucket(rank, &bucket.unwrap_or_default());
    }

    let locations: Vec<(String, MobLocationState)> = store.list(Collection::MobLocations).await?;
    for (key, state) in locations {
        projection.merge_location(&MobId::from(key.as_str()), state);
    }

    Ok(projection)
}
