use crate::types::{
    ChangeAction, Cluster, ClusterStatus, EventResource, ResourceEvent, ResourceKind,
};

/// Builds a push event for tests.
pub fn resource_event(
    kind: ResourceKind,
    action: ChangeAction,
    name: &str,
    phase: &str,
    cluster_id: Option<&str>,
) -> ResourceEvent {
    ResourceEvent {
        kind,
        action,
        resource: EventResource {
            name: name.to_owned(),
            phase: Some(phase.to_owned()),
        },
        cluster_id: cluster_id.map(str::to_owned),
    }
}

pub fn backup_event(
    action: ChangeAction,
    name: &str,
    phase: &str,
    cluster_id: Option<&str>,
) -> ResourceEvent {
    resource_event(ResourceKind::Backup, action, name, phase, cluster_id)
}

pub fn restore_event(
    action: ChangeAction,
    name: &str,
    phase: &str,
    cluster_id: Option<&str>,
) -> ResourceEvent {
    resource_event(ResourceKind::Restore, action, name, phase, cluster_id)
}

pub fn schedule_event(
    action: ChangeAction,
    name: &str,
    phase: &str,
    cluster_id: Option<&str>,
) -> ResourceEvent {
    resource_event(ResourceKind::Schedule, action, name, phase, cluster_id)
}

pub fn storage_location_event(
    action: ChangeAction,
    name: &str,
    phase: &str,
    cluster_id: Option<&str>,
) -> ResourceEvent {
    resource_event(
        ResourceKind::StorageLocation,
        action,
        name,
        phase,
        cluster_id,
    )
}

/// Builds a cluster named `Cluster {id}` for tests.
pub fn test_cluster(id: &str, is_default: bool) -> Cluster {
    Cluster {
        id: id.to_owned(),
        name: format!("Cluster {id}"),
        namespace: "velero".to_owned(),
        status: ClusterStatus::Connected,
        status_message: None,
        is_default,
        created_at: None,
        last_health_check: None,
    }
}
