use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::SyncResult;
use crate::storage::StateStorage;
use crate::types::Cluster;

/// Durable storage key holding the active cluster identifier.
const SELECTED_CLUSTER_KEY: &str = "selected-cluster";

#[derive(Debug, Default)]
struct Inner {
    selected: Option<String>,
    known: Vec<Cluster>,
}

/// Source of truth for which cluster's data is currently displayed.
///
/// The selection is persisted through a [`StateStorage`] so it survives
/// restarts; the last-known cluster list is kept in memory only and is
/// refreshed by the cluster polling loop. In-memory reads are synchronous so
/// the invalidation router can consult the store from inside event delivery.
#[derive(Debug)]
pub struct ClusterStore<S> {
    storage: S,
    inner: Arc<RwLock<Inner>>,
}

impl<S> Clone for ClusterStore<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S> ClusterStore<S>
where
    S: StateStorage,
{
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Loads the persisted selection, if any.
    ///
    /// Idempotent and safe to call multiple times; a missing entry leaves the
    /// selection unset.
    pub async fn initialize(&self) -> SyncResult<()> {
        let saved = self.storage.load(SELECTED_CLUSTER_KEY).await?;

        if let Some(saved) = saved {
            let mut inner = self.inner.write().expect("cluster store lock poisoned");
            inner.selected = Some(saved);
        }

        Ok(())
    }

    /// Sets the active cluster and persists the choice.
    ///
    /// Overwriting a previous selection is always allowed. The durable write
    /// happens first so a crash between the two steps loses at most the
    /// newest value.
    pub async fn set_selected(&self, cluster_id: &str) -> SyncResult<()> {
        self.storage.save(SELECTED_CLUSTER_KEY, cluster_id).await?;

        let mut inner = self.inner.write().expect("cluster store lock poisoned");
        inner.selected = Some(cluster_id.to_owned());

        Ok(())
    }

    /// Clears the active cluster and removes the durable entry.
    pub async fn clear_selected(&self) -> SyncResult<()> {
        self.storage.remove(SELECTED_CLUSTER_KEY).await?;

        let mut inner = self.inner.write().expect("cluster store lock poisoned");
        inner.selected = None;

        Ok(())
    }

    /// Returns the currently selected cluster identifier.
    pub fn selected(&self) -> Option<String> {
        let inner = self.inner.read().expect("cluster store lock poisoned");
        inner.selected.clone()
    }

    /// Replaces the last-known cluster list.
    pub fn set_known_clusters(&self, clusters: Vec<Cluster>) {
        let mut inner = self.inner.write().expect("cluster store lock poisoned");

        if inner.known.len() != clusters.len() {
            debug!("cluster list changed to {} clusters", clusters.len());
        }
        inner.known = clusters;
    }

    /// Returns the last-known cluster list.
    pub fn known_clusters(&self) -> Vec<Cluster> {
        let inner = self.inner.read().expect("cluster store lock poisoned");
        inner.known.clone()
    }

    /// Returns whether more than one cluster is configured.
    pub fn is_multi_cluster(&self) -> bool {
        let inner = self.inner.read().expect("cluster store lock poisoned");
        inner.known.len() > 1
    }

    /// Returns a human-readable label for a cluster identifier.
    ///
    /// Falls back to the identifier itself when the cluster is not in the
    /// last-known list.
    pub fn cluster_label(&self, cluster_id: &str) -> String {
        let inner = self.inner.read().expect("cluster store lock poisoned");
        inner
            .known
            .iter()
            .find(|cluster| cluster.id == cluster_id)
            .map(|cluster| cluster.name.clone())
            .unwrap_or_else(|| cluster_id.to_owned())
    }
}
