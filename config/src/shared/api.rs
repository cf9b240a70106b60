use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Connection settings for the backup orchestration REST API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST collaborator, e.g. `http://localhost:8080`.
    ///
    /// All request paths are appended under `/api`.
    pub base_url: String,
}

impl ApiConfig {
    /// Validates the API connection settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }

        Ok(())
    }
}
