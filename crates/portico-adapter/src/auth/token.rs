/*
[INPUT]:  Access tokens produced by a login run
[OUTPUT]: Current bearer token for outgoing requests
[POS]:    Auth layer - token lifecycle storage
[UPDATE]: When changing what the session caches per token
*/

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

/// Stored token with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub wallet_address: String,
    pub issued_at: DateTime<Utc>,
}

/// Thread-safe store for the current marketplace access token.
///
/// Written only by the session layer; the HTTP client just reads the
/// current token when building requests.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued token
    pub fn set_token(&self, token: String, wallet_address: String) {
        let token_data = TokenData {
            token,
            wallet_address,
            issued_at: Utc::now(),
        };

        let mut guard = self.data.write().unwrap();
        *guard = Some(token_data);
    }

    /// Get the current token if one is set
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap();
        guard.as_ref().map(|data| data.token.clone())
    }

    /// Get the full token snapshot if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap();
        guard.clone()
    }

    /// Whether a token is currently set
    pub fn is_set(&self) -> bool {
        let guard = self.data.read().unwrap();
        guard.is_some()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap();
        *guard = None;
    }
}
