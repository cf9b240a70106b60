use tracing::info;

use crate::cluster::ClusterStore;
use crate::error::SyncResult;
use crate::storage::StateStorage;
use crate::types::Cluster;

/// Decision produced by evaluating the selection against a cluster list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The current selection (or lack of one) is still valid.
    Keep,
    /// Select this cluster.
    Select(String),
    /// The list is empty; drop the stale selection.
    Clear,
}

/// Evaluates the auto-selection policy.
///
/// Guarantees that whenever at least one cluster exists, exactly one is
/// treated as active:
/// - an empty list clears any stale selection;
/// - a selection still present in the list is kept untouched, so refreshes
///   never thrash the choice;
/// - otherwise the cluster flagged as default wins, falling back to the
///   first in list order.
pub fn evaluate(selected: Option<&str>, clusters: &[Cluster]) -> SelectionOutcome {
    if clusters.is_empty() {
        return if selected.is_some() {
            SelectionOutcome::Clear
        } else {
            SelectionOutcome::Keep
        };
    }

    if let Some(selected) = selected {
        if clusters.iter().any(|cluster| cluster.id == selected) {
            return SelectionOutcome::Keep;
        }
    }

    let chosen = clusters
        .iter()
        .find(|cluster| cluster.is_default)
        .unwrap_or(&clusters[0]);

    SelectionOutcome::Select(chosen.id.clone())
}

/// Records the cluster list on the store and repairs the selection.
///
/// Runs on every cluster list refresh, not just at startup, so a cluster
/// deleted while selected is replaced on the next poll.
pub async fn apply_auto_selection<S>(
    store: &ClusterStore<S>,
    clusters: Vec<Cluster>,
) -> SyncResult<SelectionOutcome>
where
    S: StateStorage,
{
    let outcome = evaluate(store.selected().as_deref(), &clusters);
    store.set_known_clusters(clusters);

    match &outcome {
        SelectionOutcome::Keep => {}
        SelectionOutcome::Select(cluster_id) => {
            info!("auto-selecting cluster {cluster_id}");
            store.set_selected(cluster_id).await?;
        }
        SelectionOutcome::Clear => {
            info!("last cluster removed, clearing selection");
            store.clear_selected().await?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterStatus;

    fn cluster(id: &str, is_default: bool) -> Cluster {
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

    #[test]
    fn selects_default_cluster_when_nothing_selected() {
        let clusters = vec![cluster("a", false), cluster("b", true)];

        assert_eq!(
            evaluate(None, &clusters),
            SelectionOutcome::Select("b".to_owned())
        );
    }

    #[test]
    fn falls_back_to_first_cluster_without_default() {
        let clusters = vec![cluster("a", false), cluster("b", false)];

        assert_eq!(
            evaluate(None, &clusters),
            SelectionOutcome::Select("a".to_owned())
        );
    }

    #[test]
    fn keeps_existing_valid_selection() {
        let clusters = vec![cluster("a", false), cluster("b", true)];

        // No thrashing: a valid non-default selection survives refreshes.
        assert_eq!(evaluate(Some("a"), &clusters), SelectionOutcome::Keep);
    }

    #[test]
    fn reselects_when_selected_cluster_was_deleted() {
        let clusters = vec![cluster("y", false)];

        assert_eq!(
            evaluate(Some("x"), &clusters),
            SelectionOutcome::Select("y".to_owned())
        );
    }

    #[test]
    fn clears_selection_when_list_becomes_empty() {
        assert_eq!(evaluate(Some("a"), &[]), SelectionOutcome::Clear);
        assert_eq!(evaluate(None, &[]), SelectionOutcome::Keep);
    }
}
