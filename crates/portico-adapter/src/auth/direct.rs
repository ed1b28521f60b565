/*
[INPUT]:  Long-term wallet keypair and the marketplace auth endpoints
[OUTPUT]: Access token from the raw-key signature login flow
[POS]:    Auth layer - direct-key login strategy
[UPDATE]: When the login message format or auth endpoints change
*/

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use reqwest::Method;

use crate::auth::keypair::Ed25519Keypair;
use crate::auth::session::{Authenticator, SessionAuth};
use crate::auth::wallet::{SignedMessage, WalletSigner};
use crate::http::{PorticoClient, PorticoError, Result};
use crate::types::{LoginData, MembershipData, NonceData};

/// Wallet signer backed by the user's long-term keypair
#[derive(Debug)]
pub struct DirectKeySigner {
    keypair: Ed25519Keypair,
    address: String,
}

impl DirectKeySigner {
    /// Create a signer from an existing keypair
    pub fn new(keypair: Ed25519Keypair) -> Self {
        let address = keypair.derive_address();
        Self { keypair, address }
    }

    /// Create a signer from a base58-encoded private key
    pub fn from_bs58(secret: &str) -> Result<Self> {
        Ok(Self::new(Ed25519Keypair::from_bs58(secret)?))
    }
}

#[async_trait]
impl WalletSigner for DirectKeySigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String> {
        Ok(self.keypair.sign_serialized(tx_bytes))
    }

    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage> {
        Ok(SignedMessage {
            bytes: BASE64.encode(message),
            signature: self.keypair.sign_serialized(message),
        })
    }
}

/// Canonical login message the marketplace verifies server-side
fn login_message(address: &str, timestamp_ms: i64, nonce: &str) -> String {
    format!("Portico login\naddress: {address}\ntimestamp: {timestamp_ms}\nnonce: {nonce}")
}

/// Raw-key login strategy.
///
/// Strictly sequential: membership check, fresh nonce, signed canonical
/// message, login. A stale nonce is never reused; every attempt fetches
/// its own.
pub struct DirectKeyAuthenticator {
    signer: Arc<DirectKeySigner>,
}

impl DirectKeyAuthenticator {
    /// Build the authenticator from a base58-encoded private key
    pub fn new(private_key: &str) -> Result<Self> {
        Ok(Self {
            signer: Arc::new(DirectKeySigner::from_bs58(private_key)?),
        })
    }

    /// Build the authenticator from an existing keypair
    pub fn from_keypair(keypair: Ed25519Keypair) -> Self {
        Self {
            signer: Arc::new(DirectKeySigner::new(keypair)),
        }
    }

    /// The wallet address this authenticator logs in as
    pub fn address(&self) -> &str {
        self.signer.address()
    }
}

#[async_trait]
impl Authenticator for DirectKeyAuthenticator {
    async fn login(&self, client: &PorticoClient) -> Result<SessionAuth> {
        let address = self.signer.address().to_string();
        tracing::debug!(%address, "starting direct-key login");

        let membership: MembershipData = client
            .send_plain(
                Method::GET,
                &format!("/api/v1/auth/member?address={address}"),
                None,
            )
            .await?;
        if !membership.exists {
            return Err(PorticoError::NotRegistered { address });
        }

        let nonce: NonceData = client
            .send_plain(
                Method::GET,
                &format!("/api/v1/auth/nonce?address={address}"),
                None,
            )
            .await?;

        let timestamp = Utc::now().timestamp_millis();
        let message = login_message(&address, timestamp, &nonce.nonce);
        let signed = self.signer.sign_personal_message(message.as_bytes()).await?;

        let login: LoginData = client
            .send_plain(
                Method::POST,
                "/api/v1/auth/login",
                Some(serde_json::json!({
                    "address": address,
                    "provider": "WALLET",
                    "signature": signed.signature,
                    "timestamp": timestamp,
                    "nonce": nonce.nonce,
                    "message": signed.bytes,
                })),
            )
            .await?;

        tracing::info!(%address, "direct-key login succeeded");
        Ok(SessionAuth {
            access_token: login.access_token,
            wallet_address: address,
            signer: self.signer.clone(),
        })
    }
}
