/*
[INPUT]:  Transaction bytes and personal messages to sign
[OUTPUT]: Chain-format signatures from either signing strategy
[POS]:    Auth layer - wallet capability abstraction
[UPDATE]: When adding signing strategies or changing signature formats
*/

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::http::Result;

/// Result of signing a personal message: the message bytes as the wallet
/// would echo them (base64) plus the serialized signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub bytes: String,
    pub signature: String,
}

/// Capability interface over the two signing strategies.
///
/// Callers must not branch on which variant they hold; both produce
/// signatures the chain verifier accepts. The trait is async to leave room
/// for external signers.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The wallet address this signer signs for
    fn address(&self) -> &str;

    /// Sign raw transaction bytes, returning a serialized signature
    async fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String>;

    /// Sign an arbitrary personal message
    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage>;
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    address: String,
    signature: String,
}

impl MockWalletSigner {
    /// Create a new mock signer with a predetermined signature
    pub fn new(address: &str, signature: &str) -> Self {
        Self {
            address: address.to_string(),
            signature: signature.to_string(),
        }
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_transaction(&self, _tx_bytes: &[u8]) -> Result<String> {
        Ok(self.signature.clone())
    }

    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage> {
        Ok(SignedMessage {
            bytes: BASE64.encode(message),
            signature: self.signature.clone(),
        })
    }
}
