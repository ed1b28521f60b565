/*
[INPUT]:  OS randomness and per-login ephemeral key material
[OUTPUT]: PKCE verifier/challenge pair and the zkLogin nonce
[POS]:    zkLogin layer - code-exchange binding values
[UPDATE]: When challenge or nonce derivation changes
*/

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Single-use PKCE state for one authorization-code exchange.
///
/// The verifier never leaves the process; only the challenge is sent to
/// the authorization server.
#[derive(Debug)]
pub struct PkceExchange {
    pub verifier: String,
    pub challenge: String,
}

impl PkceExchange {
    /// Generate a fresh verifier/challenge pair
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a cryptographically random code verifier.
///
/// 48 random bytes encode to a 64-character URL-safe string, inside the
/// RFC 7636 43-128 character bound.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 48];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge: `base64url(SHA256(verifier))`, no padding
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Fresh randomness for one zkLogin attempt
pub fn generate_randomness() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the zkLogin nonce binding the ephemeral key to the OAuth grant.
///
/// Deterministic over (ephemeral public key, maxEpoch, randomness); the
/// provider embeds it in the identity token, which is what prevents token
/// replay against a different keypair.
pub fn zklogin_nonce(ephemeral_public_key: &[u8; 32], max_epoch: u64, randomness: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ephemeral_public_key);
    hasher.update(max_epoch.to_le_bytes());
    hasher.update(randomness.as_bytes());
    let digest = hasher.finalize();
    URL_SAFE_NO_PAD.encode(&digest[..20])
}
