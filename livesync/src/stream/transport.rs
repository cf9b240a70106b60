use futures::StreamExt;
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::SyncResult;

/// A single live connection to the push-event source.
///
/// Yields raw text payloads; framing concerns of the underlying transport
/// (ping/pong, binary frames) are handled or skipped internally.
pub trait EventStream: Send {
    /// Returns the next text payload from the connection.
    ///
    /// Resolves to `None` once the connection is closed cleanly and to
    /// `Some(Err(_))` on a transport error; both mean the connection is no
    /// longer usable and the caller should reconnect.
    fn next_message(&mut self) -> impl Future<Output = Option<SyncResult<String>>> + Send;
}

/// Factory for connections to the push-event source.
///
/// This is the seam that makes the reconnecting client testable: production
/// code connects WebSockets, tests inject scripted connections.
pub trait StreamConnector: Send + Sync + 'static {
    type Stream: EventStream;

    /// Opens a new connection to the given URL.
    fn connect(&self, url: &str) -> impl Future<Output = SyncResult<Self::Stream>> + Send;
}

/// Production connector that opens WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl StreamConnector for WebSocketConnector {
    type Stream = WebSocketEventStream;

    async fn connect(&self, url: &str) -> SyncResult<WebSocketEventStream> {
        let (stream, _response) = connect_async(url).await?;

        Ok(WebSocketEventStream { inner: stream })
    }
}

/// [`EventStream`] implementation over a WebSocket connection.
pub struct WebSocketEventStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EventStream for WebSocketEventStream {
    async fn next_message(&mut self) -> Option<SyncResult<String>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Ping/pong is answered by the transport; binary frames are
                // not part of the event protocol.
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}
