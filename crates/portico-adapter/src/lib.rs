/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Portico adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod types;
pub mod zklogin;

// Re-export commonly used types from auth
pub use auth::{
    Authenticator,
    DirectKeyAuthenticator,
    DirectKeySigner,
    Ed25519Keypair,
    MockWalletSigner,
    SessionAuth,
    SessionManager,
    SignedMessage,
    TokenData,
    TokenStore,
    WalletSigner,
    build_authenticator,
};

// Re-export commonly used types from config
pub use config::{AdapterConfig, LoginStrategy, Network, NetworkConfig};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    PorticoClient,
    PorticoError,
    Result,
    SignedTx,
    UploadPart,
    sign_prepared,
};

// Re-export all wire types
pub use types::*;

// Re-export commonly used types from zklogin
pub use zklogin::{
    ZkLoginAuthenticator,
    ZkLoginSigner,
    ZkLoginState,
    wait_for_authorization_code,
};
