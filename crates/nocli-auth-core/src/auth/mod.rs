//! Authentication module for tracking the login state.
//!
//! This module provides:
//! - `AuthSession`: the session state holder (status, token, login/setup/logout)
//! - `TokenStore`: the durable slot the token is mirrored into
//! - `current`/`try_current`: task-scoped access to the active session
//!
//! Stored tokens have no expiry and are not validated on startup.

pub mod context;
pub mod session;
pub mod store;

pub use context::{current, try_current};
pub use session::{AuthSession, SessionState, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY};
