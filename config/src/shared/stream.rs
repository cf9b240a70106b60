use serde::{Deserialize, Serialize};

use crate::shared::{ReconnectConfig, ValidationError};

/// Path of the push-event endpoint on the backend host.
const STREAM_PATH: &str = "/ws";

/// Settings for the push-event stream connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Explicit stream URL override, e.g. `wss://backup.internal/ws`.
    ///
    /// When absent, the URL is derived from the API base URL by mapping the
    /// http(s) scheme to ws(s) and appending the stream path.
    pub url: Option<String>,

    /// Reconnect backoff policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl StreamConfig {
    /// Returns the effective stream URL for the given API base URL.
    ///
    /// The override wins when present; otherwise `http://host` becomes
    /// `ws://host/ws` and `https://host` becomes `wss://host/ws`.
    pub fn effective_url(&self, api_base_url: &str) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let derived = if let Some(rest) = api_base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = api_base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            api_base_url.to_owned()
        };

        format!("{}{STREAM_PATH}", derived.trim_end_matches('/'))
    }

    /// Validates the stream settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(ValidationError::InvalidStreamUrl);
            }
        }

        if self.reconnect.backoff_factor < 1.0 {
            return Err(ValidationError::BackoffFactorTooSmall);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_url_derives_ws_scheme_from_api_base() {
        let stream = StreamConfig {
            url: None,
            reconnect: ReconnectConfig::default(),
        };

        assert_eq!(
            stream.effective_url("http://localhost:8080"),
            "ws://localhost:8080/ws"
        );
        assert_eq!(
            stream.effective_url("https://backup.example.com/"),
            "wss://backup.example.com/ws"
        );
    }

    #[test]
    fn effective_url_prefers_explicit_override() {
        let stream = StreamConfig {
            url: Some("wss://push.example.com/ws".to_owned()),
            reconnect: ReconnectConfig::default(),
        };

        assert_eq!(
            stream.effective_url("http://localhost:8080"),
            "wss://push.example.com/ws"
        );
    }

    #[test]
    fn validate_rejects_non_ws_override() {
        let stream = StreamConfig {
            url: Some("http://push.example.com/ws".to_owned()),
            reconnect: ReconnectConfig::default(),
        };

        assert!(stream.validate().is_err());
    }
}
