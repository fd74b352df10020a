//! API client integration tests against a mock backend
//!
//! Covers the retry policy (transport failures only, bounded attempts) and
//! the session-expiry interception (credential purge + handler side effect,
//! error still surfaced to the caller).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meeplelog_core::crypto::KdfParams;
use meeplelog_core::{
    ApiClient, ApiClientConfig, ClientError, CredentialStore, EncryptedFileStore, OpenMatch,
    SecretString, SessionExpiryHandler, SessionTracker,
};

/// Records how many times the backend invalidated the session
#[derive(Default)]
struct CountingHandler {
    fired: AtomicUsize,
}

#[async_trait]
impl SessionExpiryHandler for CountingHandler {
    async fn on_session_expired(&self) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    client: ApiClient,
    credentials: CredentialStore,
    handler: Arc<CountingHandler>,
    _storage_dir: TempDir,
}

async fn harness(server: &MockServer) -> Harness {
    harness_with(server, |config| config).await
}

async fn harness_with(
    server: &MockServer,
    tune: impl FnOnce(ApiClientConfig) -> ApiClientConfig,
) -> Harness {
    let storage_dir = TempDir::new().unwrap();
    let store = EncryptedFileStore::with_dir(
        storage_dir.path().to_path_buf(),
        &SecretString::new("test-secret".to_string()),
        Some(KdfParams {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        }),
    )
    .unwrap();
    let credentials = CredentialStore::new(Arc::new(store));

    let base_url = url::Url::parse(&server.uri()).unwrap();
    let config = tune(ApiClientConfig::new(base_url));

    let handler = Arc::new(CountingHandler::default());
    let client = ApiClient::new(config, credentials.clone(), handler.clone()).unwrap();

    Harness {
        client,
        credentials,
        handler,
        _storage_dir: storage_dir,
    }
}

#[tokio::test]
async fn get_returns_parsed_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "g1", "title": "Catan" }
        ])))
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let value = h.client.get("games", None).await.unwrap();

    assert_eq!(value[0]["title"], "Catan");
    assert_eq!(h.handler.fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bearer_token_is_attached_when_given() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userId": "u1" })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let value = h.client.get("profile", Some("abc123")).await.unwrap();

    assert_eq!(value["userId"], "u1");
}

#[tokio::test]
async fn timeout_is_retried_up_to_the_cap() {
    let server = MockServer::start().await;

    // Every attempt outlives the client timeout
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(3)
        .mount(&server)
        .await;

    let h = harness_with(&server, |config| {
        config
            .with_timeout(Duration::from_millis(100))
            .with_max_retries(2)
            .with_backoff_base(Duration::from_millis(10))
    })
    .await;

    let result = h.client.get("games", None).await;

    match result {
        Err(ClientError::Network { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected network error after retries, got {:?}", other),
    }
}

#[tokio::test]
async fn application_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/matches"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "msg": "Nome obrigatório" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let result = h
        .client
        .post("matches", &json!({ "gameId": "g1" }), Some("abc123"))
        .await;

    match result {
        Err(ClientError::Api { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("Nome obrigatório"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(h.handler.fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn token_invalido_purges_credentials_and_fires_handler_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "Token inválido" })))
        .mount(&server)
        .await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let result = h.client.get("profile", Some("abc123")).await;

    assert!(matches!(result, Err(ClientError::SessionExpired { status: 401, .. })));
    assert_eq!(h.credentials.token().await.unwrap(), None);
    assert_eq!(h.credentials.user_id().await.unwrap(), None);
    assert_eq!(h.handler.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn jwt_expired_purges_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/open"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "jwt expired" })))
        .mount(&server)
        .await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let result = h.client.get("matches/open", Some("abc123")).await;

    assert!(matches!(result, Err(ClientError::SessionExpired { .. })));
    assert_eq!(h.credentials.token().await.unwrap(), None);
    assert_eq!(h.handler.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unrelated_errors_leave_credentials_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "msg": "Recurso não encontrado" })),
        )
        .mount(&server)
        .await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let result = h.client.get("matches/42", Some("abc123")).await;

    assert!(matches!(result, Err(ClientError::Api { status: 404, .. })));
    assert_eq!(
        h.credentials.token().await.unwrap(),
        Some("abc123".to_string())
    );
    assert_eq!(
        h.credentials.user_id().await.unwrap(),
        Some("u1".to_string())
    );
    assert_eq!(h.handler.fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_success_body_resolves_to_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/matches/42"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let value = h.client.delete("matches/42", Some("abc123")).await.unwrap();

    assert!(value.is_null());
}

#[tokio::test]
async fn session_tracker_reports_open_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/open"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m7",
            "gameTitle": "Wingspan",
            "startedAt": "2026-08-20T19:30:00Z"
        })))
        .mount(&server)
        .await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let tracker = SessionTracker::new(h.client.clone(), h.credentials.clone());

    assert!(tracker.is_authenticated().await.unwrap());
    assert_eq!(
        tracker.open_match().await.unwrap(),
        Some(OpenMatch {
            id: "m7".to_string(),
            game_title: "Wingspan".to_string(),
            started_at: "2026-08-20T19:30:00Z".to_string(),
        })
    );
}

#[tokio::test]
async fn session_tracker_maps_404_to_no_open_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/open"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "msg": "Recurso não encontrado" })),
        )
        .mount(&server)
        .await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let tracker = SessionTracker::new(h.client.clone(), h.credentials.clone());

    assert_eq!(tracker.open_match().await.unwrap(), None);
}

#[tokio::test]
async fn session_tracker_skips_lookup_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let tracker = SessionTracker::new(h.client.clone(), h.credentials.clone());

    assert!(!tracker.is_authenticated().await.unwrap());
    assert_eq!(tracker.open_match().await.unwrap(), None);
}

#[tokio::test]
async fn logout_destroys_the_credential_record() {
    let server = MockServer::start().await;

    let h = harness(&server).await;
    h.credentials.store_login("abc123", "u1").await.unwrap();

    let tracker = SessionTracker::new(h.client.clone(), h.credentials.clone());
    tracker.logout().await.unwrap();

    assert!(!tracker.is_authenticated().await.unwrap());
    assert_eq!(h.credentials.token().await.unwrap(), None);
}
