/*
[INPUT]:  A login strategy and the shared HTTP client
[OUTPUT]: Lazily initialized session (token + signer), one login at a time
[POS]:    Auth layer - session coordinator and single-flight initializer
[UPDATE]: When session lifecycle or invalidation semantics change
*/

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use crate::auth::wallet::WalletSigner;
use crate::http::{Hook, PorticoClient, PorticoError, Result};

/// Everything one successful login run produces
pub struct SessionAuth {
    pub access_token: String,
    pub wallet_address: String,
    pub signer: Arc<dyn WalletSigner>,
}

impl std::fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuth")
            .field("access_token", &self.access_token)
            .field("wallet_address", &self.wallet_address)
            .field("signer", &self.signer.address())
            .finish()
    }
}

/// A login strategy producing a session token and a ready-to-use signer
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, client: &PorticoClient) -> Result<SessionAuth>;
}

type InitFuture = Shared<BoxFuture<'static, std::result::Result<(), Arc<PorticoError>>>>;

#[derive(Default)]
struct SessionState {
    initialized: bool,
    in_flight: Option<InitFuture>,
}

#[derive(Clone)]
struct SessionIdentity {
    wallet_address: String,
    signer: Arc<dyn WalletSigner>,
}

struct SessionInner {
    client: PorticoClient,
    authenticator: Arc<dyn Authenticator>,
    state: Mutex<SessionState>,
    identity: RwLock<Option<SessionIdentity>>,
}

/// Session coordinator.
///
/// Owns the token lifecycle exclusively: the client reads the token store
/// but never writes it. `ensure_init` is idempotent and concurrency-safe;
/// concurrent callers join one shared login attempt instead of starting
/// their own.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Create a session manager over a client and a login strategy.
    ///
    /// Call `install_hooks` to wire the client's lazy-init and 401
    /// handling through this manager.
    pub fn new(client: PorticoClient, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                authenticator,
                state: Mutex::new(SessionState::default()),
                identity: RwLock::new(None),
            }),
        }
    }

    /// Install the client hooks: before-request runs `ensure_init`, the
    /// unauthorized hook invalidates and re-runs it.
    ///
    /// Hooks hold weak references, so dropping the manager disables them
    /// instead of leaking a reference cycle.
    pub fn install_hooks(&self) {
        let weak = Arc::downgrade(&self.inner);
        let before: Hook = Arc::new(move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => SessionManager { inner }.ensure_init().await,
                    None => Ok(()),
                }
            }
            .boxed()
        });
        self.inner.client.set_before_request_hook(before);

        let weak = Arc::downgrade(&self.inner);
        let unauthorized: Hook = Arc::new(move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        let manager = SessionManager { inner };
                        manager.invalidate().await;
                        manager.ensure_init().await
                    }
                    None => Ok(()),
                }
            }
            .boxed()
        });
        self.inner.client.set_unauthorized_hook(unauthorized);
    }

    /// Ensure the session is initialized, running at most one login.
    ///
    /// Already initialized: returns immediately with no network call.
    /// Login in flight: awaits that same attempt. Otherwise: starts one.
    /// A failed attempt propagates the same error to every waiter and
    /// leaves the next call free to retry.
    pub async fn ensure_init(&self) -> Result<()> {
        let attempt = {
            let mut state = self.inner.state.lock().await;
            if state.initialized {
                return Ok(());
            }
            match &state.in_flight {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = self.spawn_attempt();
                    state.in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await.map_err(PorticoError::Login)
    }

    fn spawn_attempt(&self) -> InitFuture {
        let inner = Arc::clone(&self.inner);
        async move {
            tracing::debug!("starting marketplace login");
            let outcome = inner.authenticator.login(&inner.client).await;

            let mut state = inner.state.lock().await;
            state.in_flight = None;
            match outcome {
                Ok(auth) => {
                    inner
                        .client
                        .token_store()
                        .set_token(auth.access_token, auth.wallet_address.clone());
                    *inner.identity.write().unwrap() = Some(SessionIdentity {
                        wallet_address: auth.wallet_address,
                        signer: auth.signer,
                    });
                    state.initialized = true;
                    tracing::info!("session initialized");
                    Ok(())
                }
                Err(error) => {
                    tracing::warn!(%error, "login attempt failed");
                    Err(Arc::new(error))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Tear the session down so the next `ensure_init` runs a fresh login.
    ///
    /// An attempt that is currently in flight stays joinable: a 401
    /// arriving while re-authentication is already running joins it
    /// rather than cancelling and starting another.
    pub async fn invalidate(&self) {
        let mut state = self.inner.state.lock().await;
        state.initialized = false;
        self.inner.client.token_store().clear();
        *self.inner.identity.write().unwrap() = None;
    }

    /// Whether a login has completed and not been invalidated
    pub async fn initialized(&self) -> bool {
        self.inner.state.lock().await.initialized
    }

    /// The signer produced by the last successful login
    pub fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.inner
            .identity
            .read()
            .unwrap()
            .as_ref()
            .map(|identity| identity.signer.clone())
    }

    /// The wallet address of the current session
    pub fn wallet_address(&self) -> Option<String> {
        self.inner
            .identity
            .read()
            .unwrap()
            .as_ref()
            .map(|identity| identity.wallet_address.clone())
    }
}
