use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The API base URL must carry an http or https scheme.
    #[error("`api.base_url` must start with `http://` or `https://`")]
    InvalidApiBaseUrl,
    /// The stream URL override must carry a ws or wss scheme.
    #[error("`stream.url` must start with `ws://` or `wss://`")]
    InvalidStreamUrl,
    /// Backoff growth below 1.0 would shrink the reconnect delay.
    #[error("`stream.reconnect.backoff_factor` must be at least 1.0")]
    BackoffFactorTooSmall,
}
