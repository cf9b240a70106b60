use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use config::shared::ConsoleConfig;
use livesync::cache::{Collection, ClusterScope, InvalidationRouter, QueryCache, QueryKey};
use livesync::clients::{ApiClient, SessionStore};
use livesync::cluster::{ClusterStore, apply_auto_selection};
use livesync::concurrency::shutdown::{ShutdownRx, create_shutdown_channel};
use livesync::error::{ErrorKind, SyncResult};
use livesync::notifications::TracingSink;
use livesync::storage::{FileStateStorage, StateStorage};
use livesync::stream::{EventClient, WebSocketConnector};

/// Runs the console service until SIGINT or SIGTERM.
///
/// Wires the live-view subsystem together: durable stores, the REST client,
/// the query cache, the reconnecting event client with the invalidation
/// router, and the polling loops that keep the cluster list and stale
/// collections fresh.
pub async fn start_console(config: ConsoleConfig) -> anyhow::Result<()> {
    info!("starting backup console");

    log_config(&config);

    let storage = FileStateStorage::new(&config.storage.state_dir);

    // Restore durable state from previous runs.
    let session = SessionStore::new(storage.clone());
    session.initialize().await?;

    let clusters = ClusterStore::new(storage.clone());
    clusters.initialize().await?;

    if let Some(selected) = clusters.selected() {
        info!("restored active cluster selection: {selected}");
    }

    let cache = QueryCache::new();
    let api = ApiClient::new(&config.api, session.clone())?;

    // The event client consults the session store on every (re)connect so a
    // refreshed credential is picked up automatically.
    let token_session = session.clone();
    let stream_url = config.stream.effective_url(&config.api.base_url);
    let client = EventClient::new(
        WebSocketConnector::new(),
        stream_url,
        config.stream.reconnect.clone(),
    )
    .with_token_source(Arc::new(move || token_session.bearer_token()));

    let router = InvalidationRouter::new(cache.clone(), clusters.clone(), TracingSink::new());
    let _router_subscription = client.subscribe(router.into_observer());

    client.connect();

    let (shutdown_tx, _) = create_shutdown_channel();

    let cluster_poll = tokio::spawn(run_cluster_poll(
        api.clone(),
        clusters.clone(),
        cache.clone(),
        Duration::from_millis(config.poll.clusters_interval_ms),
        shutdown_tx.subscribe(),
    ));
    let refresher = tokio::spawn(run_stale_refresher(
        api.clone(),
        cache.clone(),
        Duration::from_millis(config.poll.resources_interval_ms),
        shutdown_tx.subscribe(),
    ));

    wait_for_termination().await;
    info!("shutting down backup console");

    let _ = shutdown_tx.shutdown();
    client.disconnect().await;

    let _ = cluster_poll.await;
    let _ = refresher.await;

    info!("backup console stopped");

    Ok(())
}

fn log_config(config: &ConsoleConfig) {
    info!(base_url = config.api.base_url, "api config");
    info!(
        url = config.stream.effective_url(&config.api.base_url),
        initial_delay_ms = config.stream.reconnect.initial_delay_ms,
        max_delay_ms = config.stream.reconnect.max_delay_ms,
        backoff_factor = config.stream.reconnect.backoff_factor,
        "stream config"
    );
    info!(
        clusters_interval_ms = config.poll.clusters_interval_ms,
        resources_interval_ms = config.poll.resources_interval_ms,
        "poll config"
    );
    info!(state_dir = config.storage.state_dir, "storage config");
}

async fn wait_for_termination() {
    use tokio::signal::unix::{SignalKind, signal};

    // Listen for SIGTERM, sent by process supervisors before SIGKILL.
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT (Ctrl+C) received");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received");
        }
    }
}

/// Periodically refreshes the cluster list and repairs the selection.
///
/// Runs the auto-selection policy on every refresh, not just at startup, so
/// a cluster deleted while selected is replaced on the next poll.
async fn run_cluster_poll<S>(
    api: ApiClient<S>,
    clusters: ClusterStore<S>,
    cache: QueryCache,
    interval: Duration,
    mut shutdown_rx: ShutdownRx,
) where
    S: StateStorage,
{
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        match api.list_clusters().await {
            Ok(list) => {
                match serde_json::to_value(&list) {
                    Ok(value) => cache.put(QueryKey::global(Collection::Clusters), value),
                    Err(err) => warn!("failed to encode cluster list for the cache: {err}"),
                }

                if let Err(err) = apply_auto_selection(&clusters, list).await {
                    warn!("failed to apply cluster auto-selection: {err}");
                }
            }
            Err(err) if err.kind() == ErrorKind::AuthenticationError => {
                error!("cluster refresh rejected, re-authentication required: {err}");
            }
            Err(err) => {
                warn!("cluster refresh failed: {err}");
            }
        }
    }
}

/// Periodically refetches collections the invalidation router marked stale.
async fn run_stale_refresher<S>(
    api: ApiClient<S>,
    cache: QueryCache,
    interval: Duration,
    mut shutdown_rx: ShutdownRx,
) where
    S: StateStorage,
{
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        for key in cache.stale_keys() {
            let cluster = match &key.scope {
                ClusterScope::Cluster(id) => Some(id.as_str()),
                ClusterScope::Default => None,
            };

            match fetch_collection(&api, key.collection, cluster).await {
                Ok(value) => cache.put(key, value),
                Err(err) if err.kind() == ErrorKind::AuthenticationError => {
                    error!("refresh of {key} rejected, re-authentication required: {err}");
                }
                Err(err) => {
                    // Stale data is acceptable; the next tick retries.
                    warn!("failed to refresh {key}: {err}");
                }
            }
        }
    }
}

async fn fetch_collection<S>(
    api: &ApiClient<S>,
    collection: Collection,
    cluster: Option<&str>,
) -> SyncResult<serde_json::Value>
where
    S: StateStorage,
{
    let value = match collection {
        Collection::Backups => serde_json::to_value(api.list_backups(cluster).await?),
        Collection::Restores => serde_json::to_value(api.list_restores(cluster).await?),
        Collection::Schedules => serde_json::to_value(api.list_schedules(cluster).await?),
        Collection::StorageLocations => {
            serde_json::to_value(api.list_storage_locations(cluster).await?)
        }
        Collection::Dashboard => serde_json::to_value(api.dashboard_stats(cluster).await?),
        Collection::Clusters => serde_json::to_value(api.list_clusters().await?),
        Collection::SharedBackups => serde_json::to_value(api.list_shared_backups().await?),
    };

    Ok(value?)
}
