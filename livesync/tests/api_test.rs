use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use serde_json::json;

use config::SecretString;
use config::shared::ApiConfig;
use livesync::clients::{ApiClient, Role, Session, SessionStore};
use livesync::error::ErrorKind;
use livesync::test_utils::MemoryStateStorage;
use telemetry::init_test_tracing;

/// Request details captured by the mock backend.
#[derive(Debug, Default, Clone)]
struct Captured {
    authorization: Option<String>,
    query: Option<String>,
}

type SharedCaptured = Arc<Mutex<Captured>>;

async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    format!("http://{addr}")
}

fn backups_body() -> serde_json::Value {
    json!([
        {
            "name": "nightly-1",
            "namespace": "velero",
            "phase": "Completed",
            "errors": 0,
            "warnings": 0,
            "storageLocation": "default",
            "itemsBackedUp": 10,
            "totalItems": 10
        },
        {
            "name": "nightly-2",
            "namespace": "velero",
            "phase": "InProgress",
            "errors": 0,
            "warnings": 1,
            "storageLocation": "default",
            "itemsBackedUp": 3,
            "totalItems": 10
        }
    ])
}

async fn list_backups_handler(
    State(captured): State<SharedCaptured>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    {
        let mut captured = captured.lock().unwrap();
        captured.authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        captured.query = query;
    }

    Json(backups_body())
}

async fn authenticated_client(
    base_url: String,
) -> (ApiClient<MemoryStateStorage>, SessionStore<MemoryStateStorage>) {
    let session = SessionStore::new(MemoryStateStorage::new());
    session
        .set_session(Session {
            token: SecretString::from("tok-1"),
            username: "ops".to_owned(),
            role: Role::Operator,
        })
        .await
        .unwrap();

    let client = ApiClient::new(&ApiConfig { base_url }, session.clone()).unwrap();

    (client, session)
}

#[tokio::test]
async fn list_backups_parses_collection_and_sends_bearer_token() {
    init_test_tracing();

    let captured = SharedCaptured::default();
    let app = Router::new()
        .route("/api/backups", get(list_backups_handler))
        .with_state(captured.clone());
    let base_url = spawn_app(app).await;

    let (client, _session) = authenticated_client(base_url).await;
    let backups = client.list_backups(None).await.unwrap();

    assert_eq!(backups.len(), 2);
    assert_eq!(backups[0].name, "nightly-1");
    assert_eq!(backups[1].phase, "InProgress");

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.authorization.as_deref(), Some("Bearer tok-1"));
    assert_eq!(captured.query, None);
}

#[tokio::test]
async fn cluster_scope_travels_as_query_parameter() {
    init_test_tracing();

    let captured = SharedCaptured::default();
    let app = Router::new()
        .route("/api/backups", get(list_backups_handler))
        .with_state(captured.clone());
    let base_url = spawn_app(app).await;

    let (client, _session) = authenticated_client(base_url).await;
    client.list_backups(Some("prod-east")).await.unwrap();

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.query.as_deref(), Some("cluster=prod-east"));
}

#[tokio::test]
async fn unauthorized_response_clears_the_session() {
    init_test_tracing();

    let app = Router::new().route(
        "/api/backups",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"}))) }),
    );
    let base_url = spawn_app(app).await;

    let (client, session) = authenticated_client(base_url).await;
    let err = client.list_backups(None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationError);
    // The stale credential is gone so the operator re-authenticates.
    assert!(!session.is_authenticated());
    assert_eq!(session.bearer_token(), None);
}

#[tokio::test]
async fn server_rejection_surfaces_the_server_message() {
    init_test_tracing();

    let app = Router::new().route(
        "/api/backups",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "a backup with this name already exists"})),
            )
        }),
    );
    let base_url = spawn_app(app).await;

    let (client, session) = authenticated_client(base_url).await;
    let request = livesync::types::CreateBackupRequest {
        name: "nightly-1".to_owned(),
        ..Default::default()
    };
    let err = client.create_backup(&request, None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestFailed);
    assert!(
        err.detail()
            .unwrap()
            .contains("a backup with this name already exists")
    );
    // Request errors do not touch the session.
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn forbidden_response_maps_to_permission_denied() {
    init_test_tracing();

    let app = Router::new().route(
        "/api/clusters/{id}",
        axum::routing::delete(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({"error": "admin role required"})),
            )
        }),
    );
    let base_url = spawn_app(app).await;

    let (client, _session) = authenticated_client(base_url).await;
    let err = client.delete_cluster("prod-east").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn backup_logs_return_raw_text() {
    init_test_tracing();

    let app = Router::new().route(
        "/api/backups/{name}/logs",
        get(|| async { "level=info msg=\"backup started\"\nlevel=info msg=\"backup done\"" }),
    );
    let base_url = spawn_app(app).await;

    let (client, _session) = authenticated_client(base_url).await;
    let logs = client.backup_logs("nightly-1", None).await.unwrap();

    assert!(logs.contains("backup started"));
    assert!(logs.contains("backup done"));
}

#[tokio::test]
async fn login_returns_the_issued_credential() {
    init_test_tracing();

    let app = Router::new().route(
        "/api/auth/login",
        post(|| async {
            Json(json!({
                "token": "issued-token",
                "username": "ops",
                "role": "admin"
            }))
        }),
    );
    let base_url = spawn_app(app).await;

    let session = SessionStore::new(MemoryStateStorage::new());
    let client = ApiClient::new(&ApiConfig { base_url }, session.clone()).unwrap();

    let login = client.login("ops", "hunter2").await.unwrap();
    assert_eq!(login.token, "issued-token");
    assert_eq!(login.role, Role::Admin);

    session
        .set_session(Session {
            token: SecretString::from(login.token.as_str()),
            username: login.username,
            role: login.role,
        })
        .await
        .unwrap();

    assert_eq!(session.bearer_token().as_deref(), Some("issued-token"));
}
