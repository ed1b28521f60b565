/*
[INPUT]:  OAuth client id, network endpoints, and a human in a browser
[OUTPUT]: Access token plus a ready-to-use ZkLoginSigner
[POS]:    zkLogin layer - browser login orchestration
[UPDATE]: When the provider, prover, or login sequence changes
*/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::auth::keypair::{Ed25519Keypair, ZKLOGIN_FLAG, blake2b256};
use crate::auth::session::{Authenticator, SessionAuth};
use crate::config::NetworkConfig;
use crate::http::{PorticoClient, PorticoError, Result};
use crate::types::{IdTokenClaims, LoginData, SaltData, decode_jwt_claims};
use crate::zklogin::capture::{
    CALLBACK_PATH, DEFAULT_CAPTURE_TIMEOUT, open_browser, wait_for_authorization_code,
};
use crate::zklogin::pkce::{PkceExchange, generate_randomness, zklogin_nonce};
use crate::zklogin::signer::{ZkLoginSigner, ZkLoginState};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default local port the redirect URI is registered under
pub const DEFAULT_CALLBACK_PORT: u16 = 8742;

/// Epochs an ephemeral key stays usable past the current one; bounds the
/// exposure window of a compromised ephemeral key
const EPOCH_VALIDITY_WINDOW: u64 = 10;

/// Browser-based OAuth + zero-knowledge-proof login strategy.
///
/// Every attempt regenerates the ephemeral keypair, randomness, nonce, and
/// PKCE state; a failed attempt retains nothing.
pub struct ZkLoginAuthenticator {
    client_id: String,
    prover_url: String,
    rpc_url: String,
    auth_url: String,
    token_url: String,
    callback_port: u16,
    capture_timeout: Duration,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    id_token: Option<String>,
}

impl ZkLoginAuthenticator {
    /// Create the authenticator for a network
    pub fn new(client_id: &str, network: &NetworkConfig) -> Self {
        Self {
            client_id: client_id.to_string(),
            prover_url: network.prover_url.to_string(),
            rpc_url: network.rpc_url.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    /// Override the authorization endpoint
    pub fn with_auth_url(mut self, url: &str) -> Self {
        self.auth_url = url.to_string();
        self
    }

    /// Override the token endpoint
    pub fn with_token_url(mut self, url: &str) -> Self {
        self.token_url = url.to_string();
        self
    }

    /// Override the proving-service endpoint
    pub fn with_prover_url(mut self, url: &str) -> Self {
        self.prover_url = url.to_string();
        self
    }

    /// Override the chain RPC endpoint
    pub fn with_rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = url.to_string();
        self
    }

    /// Override the local callback port (must match the registered
    /// redirect URI)
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// Override how long to wait for the browser redirect
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{CALLBACK_PATH}", self.callback_port)
    }

    /// Build the authorization URL carrying the PKCE challenge and the
    /// zkLogin nonce
    fn authorization_url(&self, challenge: &str, nonce: &str) -> Result<String> {
        let mut url = Url::parse(&self.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email")
            .append_pair("nonce", nonce)
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "select_account");
        Ok(url.into())
    }

    /// Current chain epoch from the fullnode system-state RPC
    async fn current_epoch(&self) -> Result<u64> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "suix_getLatestSuiSystemState",
            "params": [],
        });

        let response = self.http.post(&self.rpc_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PorticoError::upstream(status, body));
        }

        let value: serde_json::Value = response.json().await?;
        value
            .pointer("/result/epoch")
            .and_then(|epoch| epoch.as_str())
            .and_then(|epoch| epoch.parse().ok())
            .ok_or_else(|| {
                PorticoError::InvalidResponse(
                    "system state response missing epoch".to_string(),
                )
            })
    }

    /// Exchange the authorization code for an identity token
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<String> {
        let redirect_uri = self.redirect_uri();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PorticoError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenEndpointResponse = response.json().await?;
        payload.id_token.ok_or_else(|| {
            PorticoError::InvalidResponse("token endpoint response missing id_token".to_string())
        })
    }

    /// Fetch the zero-knowledge proof binding the ephemeral key to the
    /// identity token. The proof is carried opaquely by the signer.
    async fn fetch_proof(
        &self,
        jwt: &str,
        salt: &str,
        extended_ephemeral_public_key: &str,
        max_epoch: u64,
        randomness: &str,
    ) -> Result<serde_json::Value> {
        let body = serde_json::json!({
            "jwt": jwt,
            "salt": salt,
            "extendedEphemeralPublicKey": extended_ephemeral_public_key,
            "maxEpoch": max_epoch,
            "jwtRandomness": randomness,
            "keyClaimName": "sub",
        });

        let response = self.http.post(&self.prover_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PorticoError::Prover {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Address seed binding a proof to one user + application pairing.
///
/// Deterministic over (salt, claim name, claim value, audience); parts are
/// length-prefixed so adjacent values cannot collide.
pub fn address_seed(salt: &str, claim_name: &str, claim_value: &str, audience: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [salt, claim_name, claim_value, audience] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Wallet address for an address seed under a given issuer
pub fn zklogin_address(seed: &str, issuer: &str) -> String {
    let mut input = vec![ZKLOGIN_FLAG];
    input.extend_from_slice(&(issuer.len() as u64).to_le_bytes());
    input.extend_from_slice(issuer.as_bytes());
    input.extend_from_slice(seed.as_bytes());
    format!("0x{}", hex::encode(blake2b256(&input)))
}

/// Wallet address derived from identity-token claims and the user salt
pub fn address_for_claims(claims: &IdTokenClaims, salt: &str) -> String {
    let seed = address_seed(salt, "sub", &claims.sub, &claims.aud);
    zklogin_address(&seed, &claims.iss)
}

#[async_trait]
impl Authenticator for ZkLoginAuthenticator {
    async fn login(&self, client: &PorticoClient) -> Result<SessionAuth> {
        // 1. validity window for this attempt's ephemeral key
        let current_epoch = self.current_epoch().await?;
        let max_epoch = current_epoch + EPOCH_VALIDITY_WINDOW;
        tracing::debug!(current_epoch, max_epoch, "starting zkLogin");

        // 2. fresh ephemeral key, randomness, and the nonce binding them
        let ephemeral = Ed25519Keypair::generate();
        let randomness = generate_randomness();
        let nonce = zklogin_nonce(&ephemeral.public_key_bytes(), max_epoch, &randomness);

        // 3. authorization code via the loopback capture server
        let pkce = PkceExchange::generate();
        let auth_url = self.authorization_url(&pkce.challenge, &nonce)?;
        tracing::info!(url = %auth_url, "complete the login in your browser");
        open_browser(&auth_url);
        let code = wait_for_authorization_code(self.callback_port, self.capture_timeout).await?;

        // 4. code -> identity token
        let id_token = self.exchange_code(&code, &pkce.verifier).await?;
        let claims = decode_jwt_claims(&id_token)?;
        if claims.nonce.as_deref() != Some(nonce.as_str()) {
            return Err(PorticoError::OAuth(
                "identity token nonce does not match this login attempt".to_string(),
            ));
        }

        // 5. identity token -> per-user salt
        let salt: SaltData = client
            .send_plain(
                Method::POST,
                "/api/v1/auth/salt",
                Some(serde_json::json!({ "token": id_token })),
            )
            .await?;

        // 6. wallet address
        let wallet_address = address_for_claims(&claims, &salt.salt);

        // 7. proof binding the ephemeral key to the grant
        let zk_proof = self
            .fetch_proof(
                &id_token,
                &salt.salt,
                &ephemeral.extended_public_key(),
                max_epoch,
                &randomness,
            )
            .await?;

        // 8. seed binding the proof to this user + app pairing
        let seed = address_seed(&salt.salt, "sub", &claims.sub, &claims.aud);

        // 9. signer over the ephemeral key and proof state
        let signer = Arc::new(ZkLoginSigner::new(
            ephemeral,
            ZkLoginState {
                wallet_address: wallet_address.clone(),
                address_seed: seed,
                max_epoch,
                zk_proof,
            },
        ));

        // 10. marketplace login; identity already proven above
        let login: LoginData = client
            .send_plain(
                Method::POST,
                "/api/v1/auth/login",
                Some(serde_json::json!({
                    "address": wallet_address,
                    "provider": "GOOGLE",
                    "subject": claims.sub,
                })),
            )
            .await?;

        tracing::info!(address = %wallet_address, "zkLogin succeeded");
        Ok(SessionAuth {
            access_token: login.access_token,
            wallet_address,
            signer,
        })
    }
}
