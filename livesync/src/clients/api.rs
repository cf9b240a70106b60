use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use config::shared::ApiConfig;

use crate::bail;
use crate::clients::SessionStore;
use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::storage::StateStorage;
use crate::types::{
    Backup, Cluster, CreateBackupRequest, CreateClusterRequest, CreateRestoreRequest,
    CreateScheduleRequest, CreateStorageLocationRequest, CreateWebhookRequest,
    CrossClusterRestoreRequest, DashboardStats, Restore, Schedule, SharedBackup,
    StorageLocation, UpdateClusterRequest, UpdateScheduleRequest, UpdateStorageLocationRequest,
    UpdateWebhookRequest, WebhookConfig,
};

/// Authentication mode advertised by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Basic,
    Oidc,
}

/// Response of the auth configuration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
}

/// Response of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: crate::clients::Role,
}

/// Response of the identity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub role: crate::clients::Role,
}

/// Generic acknowledgement body returned by delete-style endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned by the backend on rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// JSON-over-HTTP client for the backup orchestration API.
///
/// Attaches the session bearer token when one is available, scopes requests
/// to a cluster via the `cluster` query parameter, and maps backend errors
/// into [`SyncError`] kinds: a 401 clears the stored session so the operator
/// re-authenticates, other rejections carry the server-provided message.
pub struct ApiClient<S> {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore<S>,
}

impl<S> Clone for ApiClient<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S> ApiClient<S>
where
    S: StateStorage,
{
    pub fn new(config: &ApiConfig, session: SessionStore<S>) -> SyncResult<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            session,
        })
    }

    /// Builds the full URL for an API path, appending the cluster scope when
    /// one is given.
    fn endpoint(&self, path: &str, cluster: Option<&str>) -> SyncResult<Url> {
        let mut url = Url::parse(&format!("{}/api{path}", self.base_url))?;

        if let Some(cluster) = cluster {
            url.query_pairs_mut().append_pair("cluster", cluster);
        }

        Ok(url)
    }

    /// Sends a request and applies the shared error handling.
    async fn send(&self, request: reqwest::RequestBuilder) -> SyncResult<reqwest::Response> {
        let request = match self.session.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // The credential is expired or invalid: drop it so the operator
            // has to authenticate again.
            self.session.clear_session().await?;
            bail!(ErrorKind::AuthenticationError, "Session expired");
        }

        if status == StatusCode::FORBIDDEN {
            let message = Self::error_message(response, status).await;
            bail!(
                ErrorKind::PermissionDenied,
                "Insufficient role for this operation",
                message
            );
        }

        if !status.is_success() {
            let message = Self::error_message(response, status).await;
            bail!(ErrorKind::RequestFailed, "Server rejected the request", message);
        }

        Ok(response)
    }

    /// Extracts the server-provided error message, falling back to the
    /// HTTP status.
    async fn error_message(response: reqwest::Response, status: StatusCode) -> String {
        response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("request failed with status {status}"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cluster: Option<&str>,
    ) -> SyncResult<T> {
        let url = self.endpoint(path, cluster)?;
        let response = self.send(self.http.request(Method::GET, url)).await?;

        Ok(response.json().await?)
    }

    async fn get_text(&self, path: &str, cluster: Option<&str>) -> SyncResult<String> {
        let url = self.endpoint(path, cluster)?;
        let response = self.send(self.http.request(Method::GET, url)).await?;

        Ok(response.text().await?)
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        cluster: Option<&str>,
        body: Option<&B>,
    ) -> SyncResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path, cluster)?;

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.send(request).await?;

        Ok(response.json().await?)
    }

    // Auth

    pub async fn auth_config(&self) -> SyncResult<AuthConfig> {
        self.get_json("/auth/config", None).await
    }

    /// Authenticates with username and password.
    ///
    /// Returns the issued credential; callers store it in the session store
    /// to have it attached to subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> SyncResult<LoginResponse> {
        self.send_json(
            Method::POST,
            "/auth/login",
            None,
            Some(&LoginRequest { username, password }),
        )
        .await
    }

    pub async fn me(&self) -> SyncResult<Identity> {
        self.get_json("/auth/me", None).await
    }

    // Clusters

    pub async fn list_clusters(&self) -> SyncResult<Vec<Cluster>> {
        self.get_json("/clusters", None).await
    }

    pub async fn get_cluster(&self, id: &str) -> SyncResult<Cluster> {
        self.get_json(&format!("/clusters/{id}"), None).await
    }

    pub async fn create_cluster(&self, request: &CreateClusterRequest) -> SyncResult<Cluster> {
        self.send_json(Method::POST, "/clusters", None, Some(request))
            .await
    }

    pub async fn update_cluster(
        &self,
        id: &str,
        request: &UpdateClusterRequest,
    ) -> SyncResult<Cluster> {
        self.send_json(Method::PATCH, &format!("/clusters/{id}"), None, Some(request))
            .await
    }

    pub async fn delete_cluster(&self, id: &str) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/clusters/{id}"),
            None,
            None::<&()>,
        )
        .await
    }

    // Dashboard

    pub async fn dashboard_stats(&self, cluster: Option<&str>) -> SyncResult<DashboardStats> {
        self.get_json("/dashboard/stats", cluster).await
    }

    // Backups

    pub async fn list_backups(&self, cluster: Option<&str>) -> SyncResult<Vec<Backup>> {
        self.get_json("/backups", cluster).await
    }

    pub async fn get_backup(&self, name: &str, cluster: Option<&str>) -> SyncResult<Backup> {
        self.get_json(&format!("/backups/{name}"), cluster).await
    }

    pub async fn create_backup(
        &self,
        request: &CreateBackupRequest,
        cluster: Option<&str>,
    ) -> SyncResult<Backup> {
        self.send_json(Method::POST, "/backups", cluster, Some(request))
            .await
    }

    pub async fn delete_backup(
        &self,
        name: &str,
        cluster: Option<&str>,
    ) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/backups/{name}"),
            cluster,
            None::<&()>,
        )
        .await
    }

    /// Fetches the raw log output of a backup.
    pub async fn backup_logs(&self, name: &str, cluster: Option<&str>) -> SyncResult<String> {
        self.get_text(&format!("/backups/{name}/logs"), cluster).await
    }

    /// Lists backups shared across all clusters.
    pub async fn list_shared_backups(&self) -> SyncResult<Vec<SharedBackup>> {
        self.get_json("/backups/shared", None).await
    }

    // Restores

    pub async fn list_restores(&self, cluster: Option<&str>) -> SyncResult<Vec<Restore>> {
        self.get_json("/restores", cluster).await
    }

    pub async fn get_restore(&self, name: &str, cluster: Option<&str>) -> SyncResult<Restore> {
        self.get_json(&format!("/restores/{name}"), cluster).await
    }

    pub async fn create_restore(
        &self,
        request: &CreateRestoreRequest,
        cluster: Option<&str>,
    ) -> SyncResult<Restore> {
        self.send_json(Method::POST, "/restores", cluster, Some(request))
            .await
    }

    pub async fn delete_restore(
        &self,
        name: &str,
        cluster: Option<&str>,
    ) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/restores/{name}"),
            cluster,
            None::<&()>,
        )
        .await
    }

    /// Fetches the raw log output of a restore.
    pub async fn restore_logs(&self, name: &str, cluster: Option<&str>) -> SyncResult<String> {
        self.get_text(&format!("/restores/{name}/logs"), cluster).await
    }

    /// Restores a backup taken on one cluster into another.
    pub async fn create_cross_cluster_restore(
        &self,
        request: &CrossClusterRestoreRequest,
    ) -> SyncResult<Restore> {
        self.send_json(Method::POST, "/restores/cross-cluster", None, Some(request))
            .await
    }

    // Schedules

    pub async fn list_schedules(&self, cluster: Option<&str>) -> SyncResult<Vec<Schedule>> {
        self.get_json("/schedules", cluster).await
    }

    pub async fn get_schedule(&self, name: &str, cluster: Option<&str>) -> SyncResult<Schedule> {
        self.get_json(&format!("/schedules/{name}"), cluster).await
    }

    pub async fn create_schedule(
        &self,
        request: &CreateScheduleRequest,
        cluster: Option<&str>,
    ) -> SyncResult<Schedule> {
        self.send_json(Method::POST, "/schedules", cluster, Some(request))
            .await
    }

    pub async fn update_schedule(
        &self,
        name: &str,
        request: &UpdateScheduleRequest,
        cluster: Option<&str>,
    ) -> SyncResult<Schedule> {
        self.send_json(
            Method::PATCH,
            &format!("/schedules/{name}"),
            cluster,
            Some(request),
        )
        .await
    }

    pub async fn delete_schedule(
        &self,
        name: &str,
        cluster: Option<&str>,
    ) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/schedules/{name}"),
            cluster,
            None::<&()>,
        )
        .await
    }

    // Storage locations

    pub async fn list_storage_locations(
        &self,
        cluster: Option<&str>,
    ) -> SyncResult<Vec<StorageLocation>> {
        self.get_json("/settings/backup-locations", cluster).await
    }

    pub async fn create_storage_location(
        &self,
        request: &CreateStorageLocationRequest,
        cluster: Option<&str>,
    ) -> SyncResult<StorageLocation> {
        self.send_json(
            Method::POST,
            "/settings/backup-locations",
            cluster,
            Some(request),
        )
        .await
    }

    pub async fn update_storage_location(
        &self,
        name: &str,
        request: &UpdateStorageLocationRequest,
        cluster: Option<&str>,
    ) -> SyncResult<StorageLocation> {
        self.send_json(
            Method::PATCH,
            &format!("/settings/backup-locations/{name}"),
            cluster,
            Some(request),
        )
        .await
    }

    pub async fn delete_storage_location(
        &self,
        name: &str,
        cluster: Option<&str>,
    ) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/settings/backup-locations/{name}"),
            cluster,
            None::<&()>,
        )
        .await
    }

    // Webhooks

    pub async fn list_webhooks(&self) -> SyncResult<Vec<WebhookConfig>> {
        self.get_json("/notifications/webhooks", None).await
    }

    pub async fn create_webhook(&self, request: &CreateWebhookRequest) -> SyncResult<WebhookConfig> {
        self.send_json(Method::POST, "/notifications/webhooks", None, Some(request))
            .await
    }

    pub async fn update_webhook(
        &self,
        id: &str,
        request: &UpdateWebhookRequest,
    ) -> SyncResult<WebhookConfig> {
        self.send_json(
            Method::PATCH,
            &format!("/notifications/webhooks/{id}"),
            None,
            Some(request),
        )
        .await
    }

    pub async fn delete_webhook(&self, id: &str) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::DELETE,
            &format!("/notifications/webhooks/{id}"),
            None,
            None::<&()>,
        )
        .await
    }

    /// Asks the backend to send a test notification through the webhook.
    pub async fn test_webhook(&self, id: &str) -> SyncResult<MessageResponse> {
        self.send_json(
            Method::POST,
            &format!("/notifications/webhooks/{id}/test"),
            None,
            None::<&()>,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryStateStorage;

    fn client() -> ApiClient<MemoryStateStorage> {
        let config = ApiConfig {
            base_url: "http://localhost:8080/".to_owned(),
        };

        ApiClient::new(&config, SessionStore::new(MemoryStateStorage::new())).unwrap()
    }

    #[test]
    fn endpoint_appends_api_prefix() {
        let url = client().endpoint("/backups", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/backups");
    }

    #[test]
    fn endpoint_appends_cluster_parameter() {
        let url = client().endpoint("/backups", Some("prod east")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/backups?cluster=prod+east"
        );
    }
}
