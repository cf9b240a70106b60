//! Push-event stream consumption.
//!
//! Contains the reconnecting [`EventClient`](client::EventClient), the
//! observer registry it fans events out to, the backoff policy used between
//! reconnect attempts, and the transport seam that lets tests drive the
//! client with scripted connections instead of real sockets.

pub mod backoff;
pub mod client;
pub mod registry;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use client::{ConnectionState, EventClient, TokenSource};
pub use registry::{ObserverRegistry, Subscription};
pub use transport::{EventStream, StreamConnector, WebSocketConnector};
