//! Task-scoped access to the active session.
//!
//! Code that sits deep below the application root can reach the session
//! without threading it through every call, as long as it runs inside
//! [`AuthSession::scope`]. Reaching for it anywhere else is a bug in the
//! caller and panics immediately.

use std::future::Future;
use std::sync::Arc;

use super::AuthSession;

tokio::task_local! {
    static CURRENT_SESSION: Arc<AuthSession>;
}

impl AuthSession {
    /// Run `fut` with `session` installed as the current session.
    pub async fn scope<F>(session: Arc<AuthSession>, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_SESSION.scope(session, fut).await
    }
}

/// The session installed by the enclosing [`AuthSession::scope`].
///
/// # Panics
///
/// Panics when called outside a scope.
pub fn current() -> Arc<AuthSession> {
    try_current().unwrap_or_else(|| panic!("auth::current() must be called within AuthSession::scope"))
}

/// Like [`current`], but returns `None` outside a scope.
pub fn try_current() -> Option<Arc<AuthSession>> {
    CURRENT_SESSION.try_with(Arc::clone).ok()
}
