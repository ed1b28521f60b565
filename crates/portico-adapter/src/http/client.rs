/*
[INPUT]:  HTTP configuration (base URL, timeouts) and a shared token store
[OUTPUT]: Typed marketplace responses with transparent re-authentication
[POS]:    HTTP layer - core client implementation
[UPDATE]: When changing retry, hook, or envelope behavior
*/

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::auth::TokenStore;
use crate::config::Network;
use crate::http::{PorticoError, Result};
use crate::types::ApiEnvelope;

/// Async hook invoked by the client around authentication events
pub type Hook = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// One part of a multipart upload.
///
/// Bytes are held in memory so the body can be rebuilt when the single
/// 401 retry re-issues the request.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadPart {
    pub fn new(name: &str, file_name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes,
        }
    }
}

enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<UploadPart>),
}

#[derive(Default)]
struct Hooks {
    before_request: RwLock<Option<Hook>>,
    on_unauthorized: RwLock<Option<Hook>>,
}

/// Main HTTP client for the Portico marketplace API.
///
/// Cheap to clone; clones share the token store and hooks.
#[derive(Clone)]
pub struct PorticoClient {
    http: Client,
    base_url: Url,
    tokens: TokenStore,
    hooks: Arc<Hooks>,
}

impl PorticoClient {
    /// Create a client for a network with default configuration
    pub fn new(network: Network) -> Result<Self> {
        Self::with_config(network, ClientConfig::default())
    }

    /// Create a client for a network with custom configuration
    pub fn with_config(network: Network, config: ClientConfig) -> Result<Self> {
        Self::with_base_url(network.config().api_base_url, config)
    }

    /// Create a client against an explicit base URL (tests, self-hosted)
    pub fn with_base_url(base_url: &str, config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            tokens: TokenStore::new(),
            hooks: Arc::new(Hooks::default()),
        })
    }

    /// The shared token store this client reads bearer tokens from
    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Install the hook awaited before the first attempt of every call
    pub fn set_before_request_hook(&self, hook: Hook) {
        *self.hooks.before_request.write().unwrap() = Some(hook);
    }

    /// Install the hook invoked on the first 401 of a call
    pub fn set_unauthorized_hook(&self, hook: Hook) {
        *self.hooks.on_unauthorized.write().unwrap() = Some(hook);
    }

    /// Issue a JSON API call and return the envelope's `data` field.
    ///
    /// Attaches the current bearer token when one is set. A 401 on the
    /// first attempt triggers the unauthorized hook and exactly one retry;
    /// a second 401 is fatal for the call.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        self.run_before_request_hook().await?;
        let payload = match body {
            Some(value) => Payload::Json(value),
            None => Payload::Empty,
        };
        self.send_with_retry(method, path, &payload).await
    }

    /// Issue a multipart upload with the same token/retry contract as
    /// `request`. No explicit Content-Type: the transport sets the
    /// multipart boundary itself.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        parts: Vec<UploadPart>,
    ) -> Result<T> {
        self.run_before_request_hook().await?;
        let payload = Payload::Multipart(parts);
        self.send_with_retry(Method::POST, path, &payload).await
    }

    /// Hook-free, bearer-free call used by the authenticators.
    ///
    /// Login traffic must not recurse into session initialization, so it
    /// bypasses both hooks and the token store.
    pub(crate) async fn send_plain<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let payload = match body {
            Some(value) => Payload::Json(value),
            None => Payload::Empty,
        };
        let response = self
            .build_request(method, path, &payload, false)?
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
    ) -> Result<T> {
        let mut retried = false;
        loop {
            let response = self
                .build_request(method.clone(), path, payload, true)?
                .send()
                .await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                let hook = self.hooks.on_unauthorized.read().unwrap().clone();
                match hook {
                    Some(hook) if !retried => {
                        tracing::debug!(path, "received 401, re-authenticating and retrying once");
                        hook().await?;
                        retried = true;
                        continue;
                    }
                    _ => return Err(PorticoError::Unauthorized),
                }
            }

            return read_envelope(response).await;
        }
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
        with_bearer: bool,
    ) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut builder = self.http.request(method, url);

        if with_bearer {
            if let Some(token) = self.tokens.get_token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    let piece = Part::bytes(part.bytes.clone())
                        .file_name(part.file_name.clone())
                        .mime_str(&part.mime)?;
                    form = form.part(part.name.clone(), piece);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }

    async fn run_before_request_hook(&self) -> Result<()> {
        let hook = self.hooks.before_request.read().unwrap().clone();
        if let Some(hook) = hook {
            hook().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for PorticoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PorticoClient")
            .field("base_url", &self.base_url.as_str())
            .field("token_set", &self.tokens.is_set())
            .finish()
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PorticoError::upstream(status, body));
    }

    let envelope: ApiEnvelope<T> = response.json().await?;
    Ok(envelope.data)
}
