use rand::random;

use livesync::cluster::{ClusterStore, SelectionOutcome, apply_auto_selection};
use livesync::storage::FileStateStorage;
use livesync::test_utils::{MemoryStateStorage, test_cluster};
use telemetry::init_test_tracing;

fn temp_storage() -> FileStateStorage {
    let dir = std::env::temp_dir().join(format!("livesync-test-{}", random::<u64>()));
    FileStateStorage::new(dir)
}

#[tokio::test]
async fn selection_round_trips_through_file_storage() {
    init_test_tracing();
    let storage = temp_storage();

    let store = ClusterStore::new(storage.clone());
    store.set_selected("prod-east").await.unwrap();

    // A fresh store over the same directory simulates a restart.
    let restored = ClusterStore::new(storage);
    restored.initialize().await.unwrap();

    assert_eq!(restored.selected().as_deref(), Some("prod-east"));
}

#[tokio::test]
async fn clearing_removes_the_durable_entry() {
    init_test_tracing();
    let storage = temp_storage();

    let store = ClusterStore::new(storage.clone());
    store.set_selected("prod-east").await.unwrap();
    store.clear_selected().await.unwrap();

    let restored = ClusterStore::new(storage);
    restored.initialize().await.unwrap();

    assert_eq!(restored.selected(), None);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    init_test_tracing();
    let storage = temp_storage();

    let store = ClusterStore::new(storage);
    store.set_selected("prod-east").await.unwrap();

    store.initialize().await.unwrap();
    store.initialize().await.unwrap();

    assert_eq!(store.selected().as_deref(), Some("prod-east"));
}

#[tokio::test]
async fn initialize_with_empty_storage_leaves_selection_unset() {
    init_test_tracing();

    let store = ClusterStore::new(temp_storage());
    store.initialize().await.unwrap();

    assert_eq!(store.selected(), None);
}

#[tokio::test]
async fn auto_selection_prefers_the_default_cluster() {
    init_test_tracing();

    let store = ClusterStore::new(MemoryStateStorage::new());

    let outcome = apply_auto_selection(
        &store,
        vec![test_cluster("a", false), test_cluster("b", true)],
    )
    .await
    .unwrap();

    assert_eq!(outcome, SelectionOutcome::Select("b".to_owned()));
    assert_eq!(store.selected().as_deref(), Some("b"));
}

#[tokio::test]
async fn auto_selection_repairs_a_deleted_selection() {
    init_test_tracing();

    let store = ClusterStore::new(MemoryStateStorage::new());
    store.set_selected("x").await.unwrap();

    let outcome = apply_auto_selection(&store, vec![test_cluster("y", false)])
        .await
        .unwrap();

    assert_eq!(outcome, SelectionOutcome::Select("y".to_owned()));
    assert_eq!(store.selected().as_deref(), Some("y"));
}

#[tokio::test]
async fn auto_selection_keeps_a_valid_selection_across_refreshes() {
    init_test_tracing();

    let store = ClusterStore::new(MemoryStateStorage::new());
    let clusters = vec![test_cluster("a", false), test_cluster("b", true)];

    store.set_selected("a").await.unwrap();

    // Repeated refreshes with an unchanged list must not thrash the choice.
    for _ in 0..3 {
        let outcome = apply_auto_selection(&store, clusters.clone()).await.unwrap();
        assert_eq!(outcome, SelectionOutcome::Keep);
    }

    assert_eq!(store.selected().as_deref(), Some("a"));
}

#[tokio::test]
async fn auto_selection_clears_when_the_last_cluster_is_removed() {
    init_test_tracing();

    let storage = MemoryStateStorage::new();
    let store = ClusterStore::new(storage.clone());
    store.set_selected("a").await.unwrap();

    let outcome = apply_auto_selection(&store, vec![]).await.unwrap();

    assert_eq!(outcome, SelectionOutcome::Clear);
    assert_eq!(store.selected(), None);

    // The durable entry is gone as well.
    let restored = ClusterStore::new(storage);
    restored.initialize().await.unwrap();
    assert_eq!(restored.selected(), None);
}

#[tokio::test]
async fn auto_selection_records_the_known_cluster_list() {
    init_test_tracing();

    let store = ClusterStore::new(MemoryStateStorage::new());

    apply_auto_selection(
        &store,
        vec![test_cluster("a", true), test_cluster("b", false)],
    )
    .await
    .unwrap();

    assert!(store.is_multi_cluster());
    assert_eq!(store.cluster_label("a"), "Cluster a");
    assert_eq!(store.cluster_label("unknown"), "unknown");
}
