/*
[INPUT]:  Mock marketplace responses (success, 401, upstream errors)
[OUTPUT]: Test results for the client token/retry contract
[POS]:    Integration tests - HTTP client
[UPDATE]: When retry or envelope behavior changes
*/

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{client_for, envelope, setup_mock_server};
use portico_adapter::{
    Authenticator, MockWalletSigner, PorticoClient, PorticoError, SessionAuth, SessionManager,
    UploadPart,
};
use reqwest::Method;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Authenticator that hands out tok1, tok2, ... without touching the network
struct SequencedAuthenticator {
    runs: AtomicUsize,
}

impl SequencedAuthenticator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Authenticator for SequencedAuthenticator {
    async fn login(&self, _client: &PorticoClient) -> portico_adapter::Result<SessionAuth> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SessionAuth {
            access_token: format!("tok{run}"),
            wallet_address: "0xabc".to_string(),
            signer: Arc::new(MockWalletSigner::new("0xabc", "sig")),
        })
    }
}

#[tokio::test]
async fn test_401_is_retried_once_with_refreshed_token() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    let authenticator = SequencedAuthenticator::new();
    let manager = SessionManager::new(client.clone(), authenticator.clone());
    manager.install_hooks();

    // stale-token attempt
    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // refreshed retry
    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(serde_json::json!({"items": ["kiosk-1"]}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data: serde_json::Value = client
        .request(Method::GET, "/api/v1/items", None)
        .await
        .expect("request after refresh");

    assert_eq!(data["items"][0], "kiosk-1");
    assert_eq!(authenticator.runs.load(Ordering::SeqCst), 2);
    assert_eq!(client.token_store().get_token(), Some("tok2".to_string()));
}

#[tokio::test]
async fn test_second_401_is_fatal_with_exactly_two_attempts() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    let authenticator = SequencedAuthenticator::new();
    let manager = SessionManager::new(client.clone(), authenticator.clone());
    manager.install_hooks();

    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client
        .request::<serde_json::Value>(Method::GET, "/api/v1/items", None)
        .await
        .unwrap_err();

    assert!(matches!(err, PorticoError::Unauthorized));
    // lazy init + one refresh, nothing more
    assert_eq!(authenticator.runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_body() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .request::<serde_json::Value>(Method::GET, "/api/v1/items", None)
        .await
        .unwrap_err();

    match err {
        PorticoError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance window");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_envelope_is_unwrapped_to_data() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 200,
            "data": {"name": "gallery"},
            "metadata": {"page": 3, "pageSize": 50}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data: serde_json::Value = client
        .request(Method::GET, "/api/v1/collections", None)
        .await
        .expect("collections");

    // callers never see the envelope or its pagination metadata
    assert_eq!(data, serde_json::json!({"name": "gallery"}));
}

#[tokio::test]
async fn test_no_bearer_header_without_token() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/v1/collections"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(serde_json::json!({"ok": true}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data: serde_json::Value = client
        .request(Method::GET, "/api/v1/collections", None)
        .await
        .expect("anonymous call");
    assert_eq!(data["ok"], true);

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|request| !request.headers.contains_key("authorization"))
    );
}

#[tokio::test]
async fn test_multipart_upload_replays_after_401() {
    let server = setup_mock_server().await;
    let client = client_for(&server);

    let authenticator = SequencedAuthenticator::new();
    let manager = SessionManager::new(client.clone(), authenticator.clone());
    manager.install_hooks();

    Mock::given(method("POST"))
        .and(path("/api/v1/items/media"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/items/media"))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(serde_json::json!({"mediaId": "m1"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let parts = vec![UploadPart::new(
        "file",
        "art.png",
        "image/png",
        vec![0x89, 0x50, 0x4e, 0x47],
    )];
    let data: serde_json::Value = client
        .upload("/api/v1/items/media", parts)
        .await
        .expect("upload after refresh");

    assert_eq!(data["mediaId"], "m1");

    // both attempts carried a full multipart body
    let requests = server.received_requests().await.unwrap();
    let uploads: Vec<_> = requests
        .iter()
        .filter(|request| request.url.path() == "/api/v1/items/media")
        .collect();
    assert_eq!(uploads.len(), 2);
    assert!(
        uploads
            .iter()
            .all(|request| !request.body.is_empty())
    );
}
