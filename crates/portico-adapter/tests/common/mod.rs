/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for portico-adapter tests

use portico_adapter::{ClientConfig, Ed25519Keypair, PorticoClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at a mock server
pub fn client_for(server: &MockServer) -> PorticoClient {
    PorticoClient::with_base_url(&server.uri(), ClientConfig::default()).expect("client init")
}

/// Deterministic keypair for tests
#[allow(dead_code)]
pub fn test_keypair() -> Ed25519Keypair {
    Ed25519Keypair::from_secret_bytes(&[1u8; 32])
}

/// Wrap a payload in the marketplace response envelope
pub fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "statusCode": 200, "data": data })
}
