/*
[INPUT]:  Secret key material (generated or bs58-imported)
[OUTPUT]: Ed25519 signatures, serialized chain signatures, wallet addresses
[POS]:    Auth layer - cryptographic signing orchestration
[UPDATE]: When the chain's signature scheme or address derivation changes
*/

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _};
use rand::rngs::OsRng;

use crate::http::{PorticoError, Result};

/// Signature scheme flag for plain ed25519 signatures
pub const ED25519_FLAG: u8 = 0x00;
/// Signature scheme flag for zkLogin composite signatures
pub const ZKLOGIN_FLAG: u8 = 0x05;

/// Ed25519 keypair used for both long-term wallet keys and per-login
/// ephemeral keys
#[derive(Debug)]
pub struct Ed25519Keypair {
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Import a keypair from a base58-encoded secret.
    ///
    /// Accepts a 32-byte seed or a 64-byte secret||public export, the two
    /// formats wallets commonly produce.
    pub fn from_bs58(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| PorticoError::Config(format!("invalid base58 private key: {e}")))?;

        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(PorticoError::Config(format!(
                "invalid private key length: expected 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);

        Ok(Self::from_secret_bytes(&seed))
    }

    /// Create a keypair from raw 32-byte secret material
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Sign a message and return the raw signature
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }

    /// Raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Flag-prefixed public key, base64-encoded (proving-service input format)
    pub fn extended_public_key(&self) -> String {
        let mut bytes = Vec::with_capacity(33);
        bytes.push(ED25519_FLAG);
        bytes.extend_from_slice(&self.public_key_bytes());
        BASE64.encode(bytes)
    }

    /// Derive the wallet address for this keypair's public key.
    ///
    /// Address scheme: 0x-prefixed hex of Blake2b-256(flag || pubkey).
    pub fn derive_address(&self) -> String {
        let mut input = Vec::with_capacity(33);
        input.push(ED25519_FLAG);
        input.extend_from_slice(&self.public_key_bytes());
        format!("0x{}", hex::encode(blake2b256(&input)))
    }

    /// Sign message bytes and return the chain's serialized signature
    pub fn sign_serialized(&self, message: &[u8]) -> String {
        serialize_signature(&self.sign(message), &self.public_key_bytes())
    }
}

/// Serialize a signature into the chain wire format:
/// base64(flag || signature || public key)
pub fn serialize_signature(signature: &Signature, public_key: &[u8; 32]) -> String {
    let mut bytes = Vec::with_capacity(1 + 64 + 32);
    bytes.push(ED25519_FLAG);
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.extend_from_slice(public_key);
    BASE64.encode(bytes)
}

/// Blake2b with a 256-bit digest, the chain's address hash
pub(crate) fn blake2b256(data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}
