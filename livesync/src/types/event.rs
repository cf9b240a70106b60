use serde::{Deserialize, Serialize};

/// Category of backend resource a push event concerns.
///
/// Wire names follow the backend event protocol, where backup storage
/// locations are abbreviated as `bsl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Backup,
    Restore,
    Schedule,
    #[serde(rename = "bsl")]
    StorageLocation,
}

/// Kind of change a push event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Added,
    Modified,
    Deleted,
}

/// Partial resource snapshot carried by a push event.
///
/// Events carry the full resource object, but only the name and phase are
/// needed for cache invalidation and notifications; all other fields are
/// ignored at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResource {
    /// Name of the affected resource.
    pub name: String,
    /// Current status phase, when the resource carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// A single push notification describing a created, changed, or deleted
/// backend resource.
///
/// Produced by the external push source and consumed exactly once per
/// observer. Delivery order within a single connection is preserved as
/// received; no ordering is assumed across resource kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    /// Which cached collection this event affects.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Whether the resource was added, modified, or deleted.
    pub action: ChangeAction,
    /// Partial snapshot of the affected resource.
    pub resource: EventResource,
    /// Identifier of the owning cluster.
    ///
    /// Single-cluster deployments omit this; the event then targets the
    /// default scope.
    #[serde(
        rename = "clusterId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_id: Option<String>,
}

impl ResourceEvent {
    /// Returns the phase carried by the event, if any.
    pub fn phase(&self) -> Option<&str> {
        self.resource.phase.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_event() {
        let raw = r#"{
            "type": "backup",
            "action": "modified",
            "resource": {"name": "nightly-1", "phase": "Completed", "errors": 0},
            "clusterId": "prod-east"
        }"#;

        let event: ResourceEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, ResourceKind::Backup);
        assert_eq!(event.action, ChangeAction::Modified);
        assert_eq!(event.resource.name, "nightly-1");
        assert_eq!(event.phase(), Some("Completed"));
        assert_eq!(event.cluster_id.as_deref(), Some("prod-east"));
    }

    #[test]
    fn decodes_event_without_cluster_or_phase() {
        let raw = r#"{
            "type": "bsl",
            "action": "added",
            "resource": {"name": "default"}
        }"#;

        let event: ResourceEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, ResourceKind::StorageLocation);
        assert_eq!(event.phase(), None);
        assert_eq!(event.cluster_id, None);
    }

    #[test]
    fn rejects_unknown_kind() {
        let raw = r#"{"type": "pod", "action": "added", "resource": {"name": "x"}}"#;
        assert!(serde_json::from_str::<ResourceEvent>(raw).is_err());
    }
}
