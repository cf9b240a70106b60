use serde::{Deserialize, Serialize};

use crate::shared::{ApiConfig, PollConfig, StorageConfig, StreamConfig, ValidationError};

/// Top-level configuration for the console service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// REST API connection settings.
    pub api: ApiConfig,
    /// Push-event stream settings.
    pub stream: StreamConfig,
    /// Background polling cadence.
    #[serde(default)]
    pub poll: PollConfig,
    /// Durable local state location.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ConsoleConfig {
    /// Validates all nested configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.stream.validate()?;

        Ok(())
    }
}
