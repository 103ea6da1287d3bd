//! Session state holder.
//!
//! `AuthSession` owns the current status and token, mirrors the token into a
//! [`TokenStore`], and publishes every change on a `watch` channel so views can
//! follow it. One holder is created by the application root and handed down;
//! there is no global instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, error, info};

use crate::api::{ApiClient, ApiError};

use super::TokenStore;

/// Which screen the user should be looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SessionStatus {
    Loading,
    SetupRequired,
    Unauthenticated,
    Authenticated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::SetupRequired => "setup-required",
            SessionStatus::Unauthenticated => "unauthenticated",
            SessionStatus::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus token. `token` is `Some` exactly when `status` is `Authenticated`;
/// the constructors are the only way to build one.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState {
    status: SessionStatus,
    token: Option<String>,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            token: None,
        }
    }

    fn setup_required() -> Self {
        Self {
            status: SessionStatus::SetupRequired,
            token: None,
        }
    }

    fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            token: None,
        }
    }

    fn authenticated(token: String) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            token: Some(token),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("status", &self.status)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub struct AuthSession {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    init: OnceCell<()>,
}

impl AuthSession {
    /// Create a holder in `Loading`. Nothing is fetched until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::loading());
        Arc::new(Self {
            api,
            store,
            state,
            init: OnceCell::new(),
        })
    }

    /// Create a holder and kick off initialization on the current runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(api: ApiClient, store: Arc<dyn TokenStore>) -> Arc<Self> {
        let session = Self::new(api, store);
        let background = Arc::clone(&session);
        tokio::spawn(async move {
            background.initialize().await;
        });
        session
    }

    /// Resolve the initial status. Runs at most once per holder; later calls
    /// wait for the first one and return.
    ///
    /// Failure policy is fail-open to the login screen: if the status check
    /// errors for any reason the session becomes `Unauthenticated` and the
    /// error is logged, never returned.
    pub async fn initialize(&self) {
        self.init
            .get_or_init(|| async {
                let next = match self.resolve_initial_state().await {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "Failed to initialize auth");
                        SessionState::unauthenticated()
                    }
                };
                info!(status = %next.status(), "Auth initialized");
                self.state.send_replace(next);
            })
            .await;
    }

    async fn resolve_initial_state(&self) -> Result<SessionState, ApiError> {
        let status = self.api.fetch_status().await?;
        if status.setup_required {
            // A token from a previous installation is meaningless now.
            self.store.clear();
            return Ok(SessionState::setup_required());
        }

        // Trusted as-is; the first rejected request is what reveals a stale one.
        match self.store.load() {
            Some(token) => Ok(SessionState::authenticated(token)),
            None => Ok(SessionState::unauthenticated()),
        }
    }

    /// Wait until initialization has settled and return the resulting state.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| s.status() != SessionStatus::Loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    // ===== Reads =====

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Client for further requests, carrying the bearer token when logged in.
    pub fn api(&self) -> ApiClient {
        match self.token() {
            Some(token) => self.api.with_token(token),
            None => self.api.without_token(),
        }
    }

    // ===== Mutations =====

    /// Log in and persist the issued token.
    ///
    /// On failure the error is returned unchanged and the state is untouched.
    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self.api.login(username, password).await?;
        self.persist_token(response.token);
        info!(username, "Login successful");
        Ok(())
    }

    /// Create the first admin account, then log in with the same credentials.
    ///
    /// A failed setup returns before the login endpoint is contacted.
    pub async fn setup_and_login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.api.setup_admin(username, password).await?;
        debug!(username, "Admin created, logging in");
        self.login_with_password(username, password).await
    }

    /// Forget the token locally. The server is not contacted.
    pub fn logout(&self) {
        self.store.clear();
        self.state.send_replace(SessionState::unauthenticated());
        info!("Logged out");
    }

    fn persist_token(&self, token: String) {
        self.store.save(&token);
        self.state.send_replace(SessionState::authenticated(token));
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("api", &self.api)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
