use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::stream::{EventStream, StreamConnector};
use crate::sync_error;
use crate::types::ResourceEvent;

/// A single frame yielded by a scripted connection.
#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    /// A text payload delivered to the client.
    Text(String),
    /// A transport error; the connection dies afterwards.
    Error,
    /// A clean server-side close.
    Close,
}

impl ScriptedFrame {
    /// A text frame carrying the JSON encoding of the event.
    pub fn event(event: &ResourceEvent) -> Self {
        ScriptedFrame::Text(serde_json::to_string(event).expect("event serialization failed"))
    }
}

/// Outcome of one scripted connect attempt.
#[derive(Debug, Clone)]
enum ConnectOutcome {
    Connect(Vec<ScriptedFrame>),
    Fail,
}

#[derive(Default)]
struct Inner {
    script: VecDeque<ConnectOutcome>,
    urls: Vec<String>,
}

/// [`StreamConnector`] driven by a pre-loaded script.
///
/// Each connect attempt consumes the next scripted outcome: a connection
/// yielding the given frames, or a failure. Once the script is exhausted,
/// further attempts park forever, which keeps paused-clock tests
/// deterministic. Clones share the same script.
#[derive(Clone)]
pub struct ScriptedConnector {
    inner: Arc<Mutex<Inner>>,
    attempts_tx: Arc<watch::Sender<u64>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        let (attempts_tx, _) = watch::channel(0);

        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            attempts_tx: Arc::new(attempts_tx),
        }
    }

    /// Scripts a successful connection that yields the given frames.
    ///
    /// A connection whose frames run out stays open until the client shuts
    /// down; end the script with [`ScriptedFrame::Close`] to drop it.
    pub fn push_connection(&self, frames: Vec<ScriptedFrame>) {
        let mut inner = self.inner.lock().expect("scripted connector lock poisoned");
        inner.script.push_back(ConnectOutcome::Connect(frames));
    }

    /// Scripts `count` consecutive connect failures.
    pub fn push_failures(&self, count: usize) {
        let mut inner = self.inner.lock().expect("scripted connector lock poisoned");
        for _ in 0..count {
            inner.script.push_back(ConnectOutcome::Fail);
        }
    }

    /// Returns how many connect attempts have been made.
    pub fn attempts(&self) -> u64 {
        *self.attempts_tx.borrow()
    }

    /// Returns the URLs passed to each connect attempt, in order.
    pub fn attempted_urls(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("scripted connector lock poisoned");
        inner.urls.clone()
    }

    /// Waits until at least `count` connect attempts have been made.
    pub async fn wait_for_attempts(&self, count: u64) {
        let mut rx = self.attempts_tx.subscribe();
        rx.wait_for(|attempts| *attempts >= count)
            .await
            .expect("scripted connector sender dropped");
    }
}

impl Default for ScriptedConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConnector for ScriptedConnector {
    type Stream = ScriptedStream;

    async fn connect(&self, url: &str) -> SyncResult<ScriptedStream> {
        let outcome = {
            let mut inner = self.inner.lock().expect("scripted connector lock poisoned");
            inner.urls.push(url.to_owned());
            inner.script.pop_front()
        };
        self.attempts_tx.send_modify(|attempts| *attempts += 1);

        match outcome {
            Some(ConnectOutcome::Connect(frames)) => Ok(ScriptedStream {
                frames: frames.into(),
            }),
            Some(ConnectOutcome::Fail) => Err(sync_error!(
                ErrorKind::ConnectionFailed,
                "Scripted connection failure"
            )),
            None => {
                // Script exhausted: park this attempt so the test decides
                // what happens next.
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// [`EventStream`] implementation that replays scripted frames.
pub struct ScriptedStream {
    frames: VecDeque<ScriptedFrame>,
}

impl EventStream for ScriptedStream {
    async fn next_message(&mut self) -> Option<SyncResult<String>> {
        match self.frames.pop_front() {
            Some(ScriptedFrame::Text(text)) => Some(Ok(text)),
            Some(ScriptedFrame::Error) => Some(Err(sync_error!(
                ErrorKind::StreamClosed,
                "Scripted stream error"
            ))),
            Some(ScriptedFrame::Close) => None,
            None => {
                // Connection stays open with nothing more to say.
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Observer that records delivered events and supports waiting on counts.
#[derive(Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ResourceEvent>>>,
    count_tx: Arc<watch::Sender<usize>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);

        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            count_tx: Arc::new(count_tx),
        }
    }

    /// Returns the callback to register on the client.
    pub fn callback(&self) -> impl Fn(&ResourceEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        let count_tx = self.count_tx.clone();

        move |event| {
            let mut events = events.lock().expect("recording observer lock poisoned");
            events.push(event.clone());
            count_tx.send_replace(events.len());
        }
    }

    /// Returns all events delivered so far.
    pub fn events(&self) -> Vec<ResourceEvent> {
        let events = self.events.lock().expect("recording observer lock poisoned");
        events.clone()
    }

    /// Waits until at least `count` events have been delivered.
    pub async fn wait_for_events(&self, count: usize) {
        let mut rx = self.count_tx.subscribe();
        rx.wait_for(|delivered| *delivered >= count)
            .await
            .expect("recording observer sender dropped");
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}
