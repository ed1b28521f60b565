/*
[INPUT]:  Raw JSON payloads from the marketplace API and OAuth provider
[OUTPUT]: Typed wire structures (envelope, transactions, auth payloads)
[POS]:    Types layer - schemas consumed by the HTTP and auth layers
[UPDATE]: When marketplace response formats change
*/

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use serde::Deserialize;

use crate::http::{PorticoError, Result};

/// Standard response envelope wrapping every marketplace payload.
///
/// Callers of the client only ever see `data`; pagination metadata is a
/// collaborator concern and passes through untouched.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    pub data: T,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Prepared transaction returned by the marketplace prepare endpoints.
///
/// `tx_bytes` is opaque to the client; only a `WalletSigner` interprets it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TxResponse {
    #[serde(rename = "txId")]
    pub tx_id: String,
    #[serde(rename = "txBytes")]
    pub tx_bytes: String,
    pub cost: f64,
    #[serde(rename = "costTokenSymbol")]
    pub cost_token_symbol: String,
    #[serde(rename = "gasBudget")]
    pub gas_budget: u64,
}

/// Membership lookup result for a wallet address
#[derive(Debug, Deserialize)]
pub struct MembershipData {
    pub exists: bool,
}

/// Single-use login nonce bound to a wallet address
#[derive(Debug, Deserialize)]
pub struct NonceData {
    pub nonce: String,
}

/// Access token issued by the marketplace login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(default, rename = "expiresIn")]
    pub expires_in: Option<u64>,
}

/// Per-user salt issued by the marketplace for zkLogin address derivation
#[derive(Debug, Deserialize)]
pub struct SaltData {
    pub salt: String,
}

/// Identity-token claims needed by the zkLogin flow.
///
/// Only the claims this crate orchestrates with; signature verification is
/// owned by the proving service and the marketplace backend.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Decode the payload segment of a JWT without verifying its signature
pub fn decode_jwt_claims(jwt: &str) -> Result<IdTokenClaims> {
    let payload_b64 = jwt
        .trim()
        .split('.')
        .nth(1)
        .ok_or_else(|| PorticoError::InvalidResponse("identity token is not a valid JWT".to_string()))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .map_err(|e| {
            PorticoError::InvalidResponse(format!("invalid JWT payload base64: {e}"))
        })?;

    let claims: IdTokenClaims = serde_json::from_slice(&payload_bytes)?;
    Ok(claims)
}
