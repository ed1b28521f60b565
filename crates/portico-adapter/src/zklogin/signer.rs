/*
[INPUT]:  Ephemeral keypair plus the proof state from one zkLogin run
[OUTPUT]: Composite zkLogin signatures the chain verifier accepts
[POS]:    zkLogin layer - zero-knowledge signing strategy
[UPDATE]: When the composite signature wire format changes
*/

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;

use crate::auth::keypair::{Ed25519Keypair, ZKLOGIN_FLAG, serialize_signature};
use crate::auth::wallet::{SignedMessage, WalletSigner};
use crate::http::Result;

/// Immutable state from one successful zkLogin run.
///
/// A fresh login produces a fresh state; nothing here mutates afterwards.
#[derive(Debug, Clone)]
pub struct ZkLoginState {
    pub wallet_address: String,
    pub address_seed: String,
    pub max_epoch: u64,
    pub zk_proof: serde_json::Value,
}

/// Wallet signer backed by the per-login ephemeral keypair.
///
/// The user's real key never exists here; transactions are signed with the
/// ephemeral key and wrapped with the proof so the chain can verify the
/// binding up to `max_epoch`.
pub struct ZkLoginSigner {
    keypair: Ed25519Keypair,
    state: ZkLoginState,
}

#[derive(Serialize)]
struct ZkLoginSignaturePayload<'a> {
    #[serde(rename = "zkProof")]
    zk_proof: &'a serde_json::Value,
    #[serde(rename = "addressSeed")]
    address_seed: &'a str,
    #[serde(rename = "maxEpoch")]
    max_epoch: u64,
    #[serde(rename = "userSignature")]
    user_signature: String,
}

impl ZkLoginSigner {
    pub fn new(keypair: Ed25519Keypair, state: ZkLoginState) -> Self {
        Self { keypair, state }
    }

    /// The proof state this signer signs under
    pub fn state(&self) -> &ZkLoginState {
        &self.state
    }
}

#[async_trait]
impl WalletSigner for ZkLoginSigner {
    fn address(&self) -> &str {
        // precomputed during login, never re-derived
        &self.state.wallet_address
    }

    async fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String> {
        let user_signature =
            serialize_signature(&self.keypair.sign(tx_bytes), &self.keypair.public_key_bytes());

        let payload = ZkLoginSignaturePayload {
            zk_proof: &self.state.zk_proof,
            address_seed: &self.state.address_seed,
            max_epoch: self.state.max_epoch,
            user_signature,
        };

        let mut framed = vec![ZKLOGIN_FLAG];
        framed.extend_from_slice(&serde_json::to_vec(&payload)?);
        Ok(BASE64.encode(framed))
    }

    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage> {
        Ok(SignedMessage {
            bytes: BASE64.encode(message),
            signature: self.keypair.sign_serialized(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> ZkLoginSigner {
        ZkLoginSigner::new(
            Ed25519Keypair::from_secret_bytes(&[2u8; 32]),
            ZkLoginState {
                wallet_address: "0xzk".to_string(),
                address_seed: "seed-1".to_string(),
                max_epoch: 62,
                zk_proof: serde_json::json!({"proofPoints": {"a": ["1"], "b": [["2"]], "c": ["3"]}}),
            },
        )
    }

    #[test]
    fn test_address_is_precomputed() {
        let signer = test_signer();
        assert_eq!(signer.address(), "0xzk");
        assert_ne!(
            signer.address(),
            Ed25519Keypair::from_secret_bytes(&[2u8; 32]).derive_address()
        );
    }

    #[tokio::test]
    async fn test_composite_signature_wraps_proof_state() {
        let signer = test_signer();
        let signature = signer.sign_transaction(b"tx-bytes").await.unwrap();

        let decoded = BASE64.decode(signature).unwrap();
        assert_eq!(decoded[0], ZKLOGIN_FLAG);

        let payload: serde_json::Value = serde_json::from_slice(&decoded[1..]).unwrap();
        assert_eq!(payload["maxEpoch"], 62);
        assert_eq!(payload["addressSeed"], "seed-1");
        assert!(payload["zkProof"]["proofPoints"].is_object());
        assert!(payload["userSignature"].is_string());
    }

    #[tokio::test]
    async fn test_personal_message_uses_ephemeral_key_directly() {
        let signer = test_signer();
        let signed = signer.sign_personal_message(b"msg").await.unwrap();

        assert_eq!(BASE64.decode(&signed.bytes).unwrap(), b"msg");
        let raw = BASE64.decode(&signed.signature).unwrap();
        // plain serialized ed25519 signature, not the composite frame
        assert_eq!(raw.len(), 97);
        assert_eq!(raw[0], crate::auth::keypair::ED25519_FLAG);
    }
}
