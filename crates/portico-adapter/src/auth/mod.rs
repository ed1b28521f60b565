/*
[INPUT]:  Credentials and the shared HTTP client
[OUTPUT]: Session tokens, wallet signers, and auth errors
[POS]:    Auth layer - handles marketplace authentication
[UPDATE]: When auth flow or signing strategies change
*/

pub mod direct;
pub mod keypair;
pub mod session;
pub mod token;
pub mod wallet;

use std::sync::Arc;

use crate::config::{AdapterConfig, LoginStrategy};
use crate::http::Result;
use crate::zklogin::ZkLoginAuthenticator;

pub use direct::{DirectKeyAuthenticator, DirectKeySigner};
pub use keypair::{ED25519_FLAG, Ed25519Keypair, ZKLOGIN_FLAG, serialize_signature};
pub use session::{Authenticator, SessionAuth, SessionManager};
pub use token::{TokenData, TokenStore};
pub use wallet::{MockWalletSigner, SignedMessage, WalletSigner};

/// Build the login strategy selected by the adapter configuration
pub fn build_authenticator(config: &AdapterConfig) -> Result<Arc<dyn Authenticator>> {
    match config.login_strategy() {
        LoginStrategy::DirectKey { private_key } => {
            Ok(Arc::new(DirectKeyAuthenticator::new(private_key)?))
        }
        LoginStrategy::ZkLogin { client_id } => Ok(Arc::new(ZkLoginAuthenticator::new(
            client_id,
            &config.network_config(),
        ))),
    }
}
