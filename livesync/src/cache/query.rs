use std::fmt;

use crate::types::ResourceKind;

/// A cached collection of fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Backups,
    Restores,
    Schedules,
    StorageLocations,
    /// Aggregate counters summarizing the other collections.
    Dashboard,
    Clusters,
    /// Backups visible across all clusters.
    SharedBackups,
}

impl Collection {
    /// Returns the collection a push event of the given kind affects.
    pub fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Backup => Collection::Backups,
            ResourceKind::Restore => Collection::Restores,
            ResourceKind::Schedule => Collection::Schedules,
            ResourceKind::StorageLocation => Collection::StorageLocations,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Backups => "backups",
            Collection::Restores => "restores",
            Collection::Schedules => "schedules",
            Collection::StorageLocations => "storage-locations",
            Collection::Dashboard => "dashboard",
            Collection::Clusters => "clusters",
            Collection::SharedBackups => "shared-backups",
        };
        f.write_str(name)
    }
}

/// Cluster scope a cached query belongs to.
///
/// Single-cluster deployments omit cluster identifiers on both requests and
/// events; their data lives under the default scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterScope {
    Default,
    Cluster(String),
}

impl ClusterScope {
    /// Builds the scope for an event's optional owning cluster.
    pub fn from_cluster_id(cluster_id: Option<&str>) -> Self {
        match cluster_id {
            Some(id) => ClusterScope::Cluster(id.to_owned()),
            None => ClusterScope::Default,
        }
    }
}

impl fmt::Display for ClusterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterScope::Default => f.write_str("default"),
            ClusterScope::Cluster(id) => f.write_str(id),
        }
    }
}

/// Identity of a cached query: which collection, for which cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub collection: Collection,
    pub scope: ClusterScope,
}

impl QueryKey {
    /// A key scoped to a specific cluster, or the default scope when absent.
    pub fn scoped(collection: Collection, cluster_id: Option<&str>) -> Self {
        Self {
            collection,
            scope: ClusterScope::from_cluster_id(cluster_id),
        }
    }

    /// A key in the default scope.
    pub fn global(collection: Collection) -> Self {
        Self {
            collection,
            scope: ClusterScope::Default,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.collection, self.scope)
    }
}
