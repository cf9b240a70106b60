use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use config::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::storage::StateStorage;
use crate::sync_error;

/// Durable storage key holding the session token.
const TOKEN_KEY: &str = "token";

/// Durable storage key holding the authenticated username.
const USERNAME_KEY: &str = "username";

/// Durable storage key holding the authenticated role.
const ROLE_KEY: &str = "role";

/// Token value used by deployments with authentication disabled.
///
/// Treated as "no credential": requests are sent without a bearer header and
/// the stream connects unauthenticated.
const NO_AUTH_TOKEN: &str = "none";

/// Permission level of the authenticated operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

impl Role {
    fn level(self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Operator => 2,
            Role::Admin => 3,
        }
    }

    /// Returns whether this role meets or exceeds the required role.
    pub fn has_role(self, required: Role) -> bool {
        self.level() >= required.level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Operator => "operator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "operator" => Ok(Role::Operator),
            "admin" => Ok(Role::Admin),
            other => Err(sync_error!(
                ErrorKind::ValidationError,
                "Unknown role in stored session",
                other
            )),
        }
    }
}

/// An authenticated session with the backup orchestration API.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub username: String,
    pub role: Role,
}

/// Durable store for the session credential bundle.
///
/// The bundle (token, username, role) is persisted as three keys so it
/// survives restarts; in-memory reads are synchronous so request paths and
/// the stream's token source can consult the store without awaiting.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    inner: Arc<RwLock<Option<Session>>>,
}

impl<S> Clone for SessionStore<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S> SessionStore<S>
where
    S: StateStorage,
{
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the persisted session, if a complete bundle is present.
    ///
    /// Idempotent; a partial or missing bundle leaves the store
    /// unauthenticated.
    pub async fn initialize(&self) -> SyncResult<()> {
        let token = self.storage.load(TOKEN_KEY).await?;
        let username = self.storage.load(USERNAME_KEY).await?;
        let role = self.storage.load(ROLE_KEY).await?;

        if let (Some(token), Some(username), Some(role)) = (token, username, role) {
            let session = Session {
                token: SecretString::from(token),
                username,
                role: role.parse()?,
            };

            let mut inner = self.inner.write().expect("session store lock poisoned");
            *inner = Some(session);
        }

        Ok(())
    }

    /// Stores a new session and persists the bundle.
    pub async fn set_session(&self, session: Session) -> SyncResult<()> {
        self.storage.save(TOKEN_KEY, session.token.expose()).await?;
        self.storage.save(USERNAME_KEY, &session.username).await?;
        self.storage.save(ROLE_KEY, session.role.as_str()).await?;

        let mut inner = self.inner.write().expect("session store lock poisoned");
        *inner = Some(session);

        Ok(())
    }

    /// Drops the session and removes the persisted bundle.
    ///
    /// Called when the server rejects the credential; the operator has to
    /// authenticate again.
    pub async fn clear_session(&self) -> SyncResult<()> {
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(USERNAME_KEY).await?;
        self.storage.remove(ROLE_KEY).await?;

        let mut inner = self.inner.write().expect("session store lock poisoned");
        *inner = None;

        Ok(())
    }

    /// Returns the current session, if authenticated.
    pub fn current(&self) -> Option<Session> {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.clone()
    }

    /// Returns the credential to attach to requests.
    ///
    /// `None` when no session exists or when the deployment runs without
    /// authentication; in both cases requests go out without a bearer header.
    pub fn bearer_token(&self) -> Option<String> {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.as_ref().and_then(|session| {
            let token = session.token.expose();
            (token != NO_AUTH_TOKEN).then(|| token.to_owned())
        })
    }

    pub fn is_authenticated(&self) -> bool {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryStateStorage;

    fn session(token: &str) -> Session {
        Session {
            token: SecretString::from(token),
            username: "ops".to_owned(),
            role: Role::Operator,
        }
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Admin.has_role(Role::Viewer));
        assert!(Role::Operator.has_role(Role::Operator));
        assert!(!Role::Viewer.has_role(Role::Operator));
    }

    #[tokio::test]
    async fn session_round_trips_through_storage() {
        let storage = MemoryStateStorage::new();

        let store = SessionStore::new(storage.clone());
        store.set_session(session("tok-1")).await.unwrap();

        // A fresh store over the same storage simulates a restart.
        let restored = SessionStore::new(storage);
        restored.initialize().await.unwrap();

        let current = restored.current().unwrap();
        assert_eq!(current.username, "ops");
        assert_eq!(current.role, Role::Operator);
        assert_eq!(restored.bearer_token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn clear_session_removes_bundle() {
        let storage = MemoryStateStorage::new();

        let store = SessionStore::new(storage.clone());
        store.set_session(session("tok-1")).await.unwrap();
        store.clear_session().await.unwrap();

        assert!(!store.is_authenticated());

        let restored = SessionStore::new(storage);
        restored.initialize().await.unwrap();
        assert!(!restored.is_authenticated());
    }

    #[tokio::test]
    async fn no_auth_sentinel_yields_no_bearer_token() {
        let store = SessionStore::new(MemoryStateStorage::new());
        store.set_session(session("none")).await.unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.bearer_token(), None);
    }

    #[tokio::test]
    async fn partial_bundle_is_ignored() {
        let storage = MemoryStateStorage::new();
        storage.save(TOKEN_KEY, "tok-1").await.unwrap();

        let store = SessionStore::new(storage);
        store.initialize().await.unwrap();

        assert!(!store.is_authenticated());
    }
}
