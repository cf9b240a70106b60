use tracing::debug;

use crate::cache::{Collection, QueryCache, QueryKey};
use crate::cluster::ClusterStore;
use crate::notifications::{Notification, NotificationSink};
use crate::storage::StateStorage;
use crate::types::{
    ChangeAction, ResourceEvent, ResourceKind, is_failure_terminal, is_success_terminal,
    PHASE_PARTIALLY_FAILED, PHASE_UNAVAILABLE,
};

/// Returns the cache keys an event invalidates.
///
/// The event's own collection and the dashboard aggregate are invalidated at
/// the event's cluster scope (the default scope when the event carries no
/// cluster). Backup events additionally invalidate the cross-cluster backup
/// aggregate when more than one cluster is configured.
pub fn invalidation_targets(event: &ResourceEvent, multi_cluster: bool) -> Vec<QueryKey> {
    let cluster = event.cluster_id.as_deref();

    let mut targets = vec![
        QueryKey::scoped(Collection::for_kind(event.kind), cluster),
        QueryKey::scoped(Collection::Dashboard, cluster),
    ];

    if multi_cluster && event.kind == ResourceKind::Backup {
        targets.push(QueryKey::global(Collection::SharedBackups));
    }

    targets
}

/// Returns whether an event belongs to the active cluster.
///
/// Events without an owning cluster id (single-cluster deployments) match
/// any selection.
fn matches_active(event_cluster: Option<&str>, active_cluster: Option<&str>) -> bool {
    match event_cluster {
        None => true,
        Some(id) => active_cluster == Some(id),
    }
}

/// Applies the notification policy to an event.
///
/// Only `Modified` events notify:
/// - backups and restores reaching the successful terminal phase notify only
///   when the event belongs to the active cluster, to avoid noise from
///   background clusters;
/// - backups and restores reaching a failed terminal phase always notify,
///   since failures must never be missed;
/// - storage locations becoming unavailable always notify.
///
/// `cluster_suffix` is appended to the message to disambiguate the source
/// cluster in multi-cluster installations.
pub fn notification_for(
    event: &ResourceEvent,
    active_cluster: Option<&str>,
    cluster_suffix: Option<&str>,
) -> Option<Notification> {
    if event.action != ChangeAction::Modified {
        return None;
    }

    let phase = event.phase()?;
    let name = &event.resource.name;
    let suffix = cluster_suffix.unwrap_or("");

    match event.kind {
        ResourceKind::Backup | ResourceKind::Restore => {
            let noun = match event.kind {
                ResourceKind::Backup => "Backup",
                _ => "Restore",
            };

            if is_success_terminal(phase) {
                if !matches_active(event.cluster_id.as_deref(), active_cluster) {
                    return None;
                }

                return Some(Notification::success(
                    format!("{noun} completed"),
                    format!("{noun} \"{name}\" completed successfully{suffix}"),
                ));
            }

            if is_failure_terminal(phase) {
                let verb = if phase == PHASE_PARTIALLY_FAILED {
                    "partially failed"
                } else {
                    "failed"
                };

                return Some(Notification::failure(
                    format!("{noun} failed"),
                    format!("{noun} \"{name}\" {verb}{suffix}"),
                ));
            }

            None
        }
        ResourceKind::StorageLocation => {
            if phase != PHASE_UNAVAILABLE {
                return None;
            }

            Some(Notification::warning(
                "Storage location unavailable",
                format!("Storage location \"{name}\" became unavailable{suffix}"),
            ))
        }
        ResourceKind::Schedule => None,
    }
}

/// Translates inbound events into cache invalidations and notifications.
///
/// Registered as an observer on the event client; consults the cluster store
/// for the active selection and the known cluster list on every event.
pub struct InvalidationRouter<S, N> {
    cache: QueryCache,
    clusters: ClusterStore<S>,
    sink: N,
}

impl<S, N> Clone for InvalidationRouter<S, N>
where
    S: Clone,
    N: Clone,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            clusters: self.clusters.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<S, N> InvalidationRouter<S, N>
where
    S: StateStorage,
    N: NotificationSink,
{
    pub fn new(cache: QueryCache, clusters: ClusterStore<S>, sink: N) -> Self {
        Self {
            cache,
            clusters,
            sink,
        }
    }

    /// Routes one event: invalidates the affected caches and publishes a
    /// notification when the policy calls for one.
    pub fn handle_event(&self, event: &ResourceEvent) {
        let multi_cluster = self.clusters.is_multi_cluster();

        for key in invalidation_targets(event, multi_cluster) {
            debug!("invalidating cached query {key}");
            self.cache.invalidate(key);
        }

        let suffix = if multi_cluster {
            event
                .cluster_id
                .as_deref()
                .map(|id| format!(" (cluster {})", self.clusters.cluster_label(id)))
        } else {
            None
        };

        let notification = notification_for(
            event,
            self.clusters.selected().as_deref(),
            suffix.as_deref(),
        );
        if let Some(notification) = notification {
            self.sink.publish(notification);
        }
    }

    /// Consumes the router into an observer callback for the event client.
    pub fn into_observer(self) -> impl Fn(&ResourceEvent) + Send + Sync + 'static {
        move |event| self.handle_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Severity;
    use crate::test_utils::{
        MemoryStateStorage, RecordingSink, backup_event, restore_event, schedule_event,
        storage_location_event, test_cluster,
    };

    fn router_fixture() -> (
        QueryCache,
        ClusterStore<MemoryStateStorage>,
        RecordingSink,
        InvalidationRouter<MemoryStateStorage, RecordingSink>,
    ) {
        let cache = QueryCache::new();
        let clusters = ClusterStore::new(MemoryStateStorage::new());
        let sink = RecordingSink::new();
        let router = InvalidationRouter::new(cache.clone(), clusters.clone(), sink.clone());

        (cache, clusters, sink, router)
    }

    #[tokio::test]
    async fn completed_backup_on_active_cluster_notifies_and_invalidates() {
        let (cache, clusters, sink, router) = router_fixture();

        clusters.set_known_clusters(vec![test_cluster("prod-east", true)]);
        clusters.set_selected("prod-east").await.unwrap();

        let event = backup_event(ChangeAction::Modified, "b1", "Completed", Some("prod-east"));
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Success);
        assert!(notifications[0].message.contains("\"b1\""));

        assert!(cache.is_stale(&QueryKey::scoped(Collection::Backups, Some("prod-east"))));
        assert!(cache.is_stale(&QueryKey::scoped(Collection::Dashboard, Some("prod-east"))));
    }

    #[tokio::test]
    async fn completed_backup_on_background_cluster_stays_silent() {
        let (cache, clusters, sink, router) = router_fixture();

        clusters.set_known_clusters(vec![
            test_cluster("prod-east", true),
            test_cluster("dr-west", false),
        ]);
        clusters.set_selected("prod-east").await.unwrap();

        let event = backup_event(ChangeAction::Modified, "b1", "Completed", Some("dr-west"));
        router.handle_event(&event);

        assert!(sink.notifications().is_empty());
        // The caches for the background cluster are still invalidated.
        assert!(cache.is_stale(&QueryKey::scoped(Collection::Backups, Some("dr-west"))));
    }

    #[tokio::test]
    async fn failed_backup_notifies_regardless_of_active_cluster() {
        let (_cache, clusters, sink, router) = router_fixture();

        clusters.set_known_clusters(vec![
            test_cluster("prod-east", true),
            test_cluster("dr-west", false),
        ]);
        clusters.set_selected("prod-east").await.unwrap();

        let event = backup_event(ChangeAction::Modified, "b2", "Failed", Some("dr-west"));
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Failure);
        // Failure toasts stay on screen longer than success toasts.
        assert!(notifications[0].duration > crate::notifications::SUCCESS_DURATION);
    }

    #[tokio::test]
    async fn partially_failed_restore_reports_partial_failure() {
        let (_cache, _clusters, sink, router) = router_fixture();

        let event = restore_event(ChangeAction::Modified, "r1", "PartiallyFailed", None);
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Failure);
        assert!(notifications[0].message.contains("partially failed"));
    }

    #[tokio::test]
    async fn unavailable_storage_location_warns() {
        let (cache, _clusters, sink, router) = router_fixture();

        let event =
            storage_location_event(ChangeAction::Modified, "default", "Unavailable", None);
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Warning);
        assert!(cache.is_stale(&QueryKey::global(Collection::StorageLocations)));
    }

    #[tokio::test]
    async fn added_events_only_invalidate() {
        let (cache, _clusters, sink, router) = router_fixture();

        let event = backup_event(ChangeAction::Added, "b3", "InProgress", None);
        router.handle_event(&event);

        assert!(sink.notifications().is_empty());
        assert!(cache.is_stale(&QueryKey::global(Collection::Backups)));
        assert!(cache.is_stale(&QueryKey::global(Collection::Dashboard)));
    }

    #[tokio::test]
    async fn schedule_events_never_notify() {
        let (cache, _clusters, sink, router) = router_fixture();

        let event = schedule_event(ChangeAction::Modified, "daily", "Enabled", None);
        router.handle_event(&event);

        assert!(sink.notifications().is_empty());
        assert!(cache.is_stale(&QueryKey::global(Collection::Schedules)));
    }

    #[tokio::test]
    async fn shared_backups_invalidated_only_with_multiple_clusters() {
        let (cache, clusters, _sink, router) = router_fixture();

        let event = backup_event(ChangeAction::Added, "b4", "InProgress", Some("prod-east"));

        clusters.set_known_clusters(vec![test_cluster("prod-east", true)]);
        router.handle_event(&event);
        assert!(!cache.is_stale(&QueryKey::global(Collection::SharedBackups)));

        clusters.set_known_clusters(vec![
            test_cluster("prod-east", true),
            test_cluster("dr-west", false),
        ]);
        router.handle_event(&event);
        assert!(cache.is_stale(&QueryKey::global(Collection::SharedBackups)));
    }

    #[tokio::test]
    async fn multi_cluster_messages_carry_cluster_label() {
        let (_cache, clusters, sink, router) = router_fixture();

        clusters.set_known_clusters(vec![
            test_cluster("prod-east", true),
            test_cluster("dr-west", false),
        ]);
        clusters.set_selected("prod-east").await.unwrap();

        let event = backup_event(ChangeAction::Modified, "b5", "Failed", Some("dr-west"));
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert!(notifications[0].message.contains("(cluster Cluster dr-west)"));
    }

    #[tokio::test]
    async fn single_cluster_messages_omit_cluster_label() {
        let (_cache, clusters, sink, router) = router_fixture();

        clusters.set_known_clusters(vec![test_cluster("prod-east", true)]);
        clusters.set_selected("prod-east").await.unwrap();

        let event = backup_event(ChangeAction::Modified, "b6", "Failed", Some("prod-east"));
        router.handle_event(&event);

        let notifications = sink.notifications();
        assert!(!notifications[0].message.contains("cluster"));
    }
}
