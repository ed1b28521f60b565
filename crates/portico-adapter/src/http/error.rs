/*
[INPUT]:  Error sources (HTTP, API, OAuth, proving service, configuration)
[OUTPUT]: Structured error types with upstream context
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Portico adapter
#[derive(Error, Debug)]
pub enum PorticoError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error (missing credential, invalid network selector)
    #[error("configuration error: {0}")]
    Config(String),

    /// Wallet has no marketplace account; registration happens out-of-band
    #[error("wallet {address} is not registered with the marketplace; create an account for this address before logging in")]
    NotRegistered { address: String },

    /// OAuth provider returned an error or the user denied consent
    #[error("OAuth authorization failed: {0}")]
    OAuth(String),

    /// No OAuth redirect arrived within the capture window
    #[error("timed out waiting for the OAuth redirect")]
    OAuthTimeout,

    /// Local callback listener could not bind its port
    #[error("failed to bind local callback listener: {0}")]
    PortBind(String),

    /// Authorization-code exchange at the provider token endpoint failed
    #[error("token exchange failed (status {status}): {body}")]
    TokenExchange { status: u16, body: String },

    /// Zero-knowledge proving service returned a non-success status
    #[error("proving service call failed (status {status}): {body}")]
    Prover { status: u16, body: String },

    /// Request still unauthorized after a token refresh
    #[error("request unauthorized after token refresh")]
    Unauthorized,

    /// Marketplace API returned a non-success status
    #[error("API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response was syntactically valid but missing required content
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A shared login attempt failed; every waiter receives the same cause
    #[error("login failed: {0}")]
    Login(Arc<PorticoError>),
}

impl PorticoError {
    /// Check if the error indicates an authentication/authorization failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            PorticoError::Unauthorized | PorticoError::NotRegistered { .. } => true,
            PorticoError::Login(inner) => inner.is_auth_error(),
            _ => false,
        }
    }

    /// Terminal errors are not worth retrying with the same inputs
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PorticoError::Config(_) | PorticoError::NotRegistered { .. }
        )
    }

    /// Create an upstream API error from a status code and body text
    pub fn upstream(status: StatusCode, body: impl Into<String>) -> Self {
        PorticoError::Upstream {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, PorticoError>;
