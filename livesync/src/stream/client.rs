use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use config::shared::ReconnectConfig;

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::stream::backoff::ReconnectPolicy;
use crate::stream::registry::{ObserverRegistry, Subscription};
use crate::stream::transport::{EventStream, StreamConnector};
use crate::types::ResourceEvent;

/// Source of the session credential attached to connection requests.
///
/// Queried on every (re)connect attempt so a refreshed credential is picked
/// up without restarting the client. Returning `None` is not an error; the
/// connection is attempted unauthenticated.
pub type TokenSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Lifecycle state of the event stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No supervisor is running; `connect()` has not been called or
    /// `disconnect()` completed.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The stream is live and events are being delivered.
    Connected,
    /// The connection was lost and the supervisor is waiting out the backoff
    /// delay before the next attempt.
    Reconnecting,
}

/// Handle to the spawned connection supervisor.
struct Supervisor {
    shutdown_tx: ShutdownTx,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    supervisor: Option<Supervisor>,
}

/// Reconnecting client for the push-event stream.
///
/// Owns at most one live connection and delivers every decoded event to all
/// current subscribers. Connection failures are retried indefinitely with
/// capped exponential backoff and are never surfaced to callers beyond the
/// implicit lack of live updates.
pub struct EventClient<C: StreamConnector> {
    connector: Arc<C>,
    url: String,
    token_source: Option<TokenSource>,
    reconnect: ReconnectConfig,
    registry: ObserverRegistry,
    state: Arc<Mutex<ConnectionState>>,
    inner: Arc<Mutex<Inner>>,
}

impl<C: StreamConnector> Clone for EventClient<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            url: self.url.clone(),
            token_source: self.token_source.clone(),
            reconnect: self.reconnect.clone(),
            registry: self.registry.clone(),
            state: self.state.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<C: StreamConnector> EventClient<C> {
    /// Creates a client for the given stream URL.
    ///
    /// The client is created disconnected; call [`EventClient::connect`] to
    /// open the stream.
    pub fn new(connector: C, url: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            url: url.into(),
            token_source: None,
            reconnect,
            registry: ObserverRegistry::new(),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Attaches a credential source queried on every connection attempt.
    pub fn with_token_source(mut self, token_source: TokenSource) -> Self {
        self.token_source = Some(token_source);
        self
    }

    /// Registers a callback invoked once per decoded inbound event.
    ///
    /// Multiple subscriptions are additive. The returned handle removes
    /// exactly this callback when dropped or unsubscribed.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ResourceEvent) + Send + Sync + 'static,
    {
        self.registry.subscribe(observer)
    }

    /// Opens the stream connection.
    ///
    /// Idempotent: a no-op while a supervisor is already running. Must be
    /// called from within a tokio runtime.
    pub fn connect(&self) {
        let mut inner = self.inner.lock().expect("event client lock poisoned");

        if let Some(supervisor) = &inner.supervisor {
            if !supervisor.handle.is_finished() {
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let task = SupervisorTask {
            connector: self.connector.clone(),
            url: self.url.clone(),
            token_source: self.token_source.clone(),
            policy: ReconnectPolicy::new(&self.reconnect),
            registry: self.registry.clone(),
            state: self.state.clone(),
            shutdown_rx,
        };
        let handle = tokio::spawn(task.run());

        inner.supervisor = Some(Supervisor {
            shutdown_tx,
            handle,
        });
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// After this returns, no further reconnection attempts occur until
    /// [`EventClient::connect`] is called again.
    pub async fn disconnect(&self) {
        let supervisor = {
            let mut inner = self.inner.lock().expect("event client lock poisoned");
            inner.supervisor.take()
        };

        let Some(supervisor) = supervisor else {
            return;
        };

        // The supervisor exits on the shutdown signal, aborting a pending
        // backoff sleep or in-flight connect attempt.
        let _ = supervisor.shutdown_tx.shutdown();
        let _ = supervisor.handle.await;
    }

    /// Returns the current connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("event client lock poisoned")
    }
}

/// The connection supervisor owned by a connected [`EventClient`].
///
/// A single task per client replaces the "at most one pending reconnect
/// timer" bookkeeping of timer-based designs: the reconnect delay is just a
/// sleep inside this loop.
struct SupervisorTask<C: StreamConnector> {
    connector: Arc<C>,
    url: String,
    token_source: Option<TokenSource>,
    policy: ReconnectPolicy,
    registry: ObserverRegistry,
    state: Arc<Mutex<ConnectionState>>,
    shutdown_rx: ShutdownRx,
}

impl<C: StreamConnector> SupervisorTask<C> {
    async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);

            let url = self.connection_url();
            let connected = tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                connected = self.connector.connect(&url) => connected,
            };

            match connected {
                Ok(stream) => {
                    info!("event stream connected");
                    self.set_state(ConnectionState::Connected);
                    self.policy.reset();

                    if self.pump_events(stream).await {
                        break;
                    }
                }
                Err(err) => {
                    debug!("event stream connection failed: {err}");
                }
            }

            self.set_state(ConnectionState::Reconnecting);

            let delay = self.policy.next_delay();
            let shutdown = tokio::select! {
                _ = self.shutdown_rx.changed() => true,
                _ = sleep(delay) => false,
            };
            if shutdown {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected);
    }

    /// Reads the connection until it dies or shutdown is requested.
    ///
    /// Returns `true` when shutdown was requested and `false` when the
    /// connection was lost and a reconnect should be scheduled.
    async fn pump_events(&mut self, mut stream: C::Stream) -> bool {
        loop {
            let message = tokio::select! {
                _ = self.shutdown_rx.changed() => return true,
                message = stream.next_message() => message,
            };

            match message {
                Some(Ok(payload)) => match serde_json::from_str::<ResourceEvent>(&payload) {
                    Ok(event) => self.registry.notify(&event),
                    Err(err) => {
                        // Malformed payloads are dropped; a following valid
                        // event restores correct cache state.
                        debug!("dropping undecodable event payload: {err}");
                    }
                },
                Some(Err(err)) => {
                    debug!("event stream error: {err}");
                    return false;
                }
                None => {
                    debug!("event stream closed by server");
                    return false;
                }
            }
        }
    }

    /// Builds the connection URL, attaching the session credential as a
    /// query parameter when one is available.
    ///
    /// The credential travels as a query parameter because the browser-grade
    /// transport on the other end does not support custom headers.
    fn connection_url(&self) -> String {
        let token = self.token_source.as_ref().and_then(|source| source());

        let Some(token) = token else {
            return self.url.clone();
        };

        match Url::parse(&self.url) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("token", &token);
                url.to_string()
            }
            // An unparseable URL fails at connect time with a clearer error.
            Err(_) => self.url.clone(),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().expect("event client lock poisoned") = state;
    }
}
