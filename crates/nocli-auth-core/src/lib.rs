//! Client-side authentication for the docker-nocli management API.
//!
//! Tracks whether the user is logged in, exchanges credentials for a bearer
//! token, and keeps that token in a durable storage slot.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthSession, FileTokenStore, MemoryTokenStore, SessionState, SessionStatus, TokenStore};
pub use config::Config;
