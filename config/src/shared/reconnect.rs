use serde::{Deserialize, Serialize};

/// Reconnect backoff policy for the push-event stream.
///
/// The delay starts at `initial_delay_ms`, grows by `backoff_factor` after
/// each consecutive failure, and is capped at `max_delay_ms`. There is no
/// attempt limit: the stream retries until explicitly disconnected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Initial delay, in milliseconds, before the first reconnect attempt.
    pub initial_delay_ms: u64,

    /// Maximum delay between reconnect attempts.
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each consecutive failure.
    pub backoff_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            max_delay_ms: 30_000,
            backoff_factor: 1.5,
        }
    }
}
