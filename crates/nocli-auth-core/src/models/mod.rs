//! Data models shared by the API client and the session holder.

pub mod auth;

pub use auth::{AuthStatus, Credentials, HealthResponse, LoginResponse, StatusResponse};
