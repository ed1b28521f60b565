/*
[INPUT]:  OAuth client id, browser interaction, chain + prover endpoints
[OUTPUT]: Zero-knowledge login sessions and signers
[POS]:    zkLogin layer - browser-based login strategy
[UPDATE]: When the OAuth flow or proof handling changes
*/

pub mod capture;
pub mod flow;
pub mod pkce;
pub mod signer;

pub use capture::{CALLBACK_PATH, DEFAULT_CAPTURE_TIMEOUT, wait_for_authorization_code};
pub use flow::{DEFAULT_CALLBACK_PORT, ZkLoginAuthenticator, address_for_claims, address_seed, zklogin_address};
pub use pkce::{PkceExchange, code_challenge, generate_code_verifier, zklogin_nonce};
pub use signer::{ZkLoginSigner, ZkLoginState};
