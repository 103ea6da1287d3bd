//! Wire and domain types for the authentication endpoints.

use serde::{Deserialize, Serialize};

/// Username/password pair sent to `/auth/setup` and `/auth/token`.
///
/// Never persisted; built per call and dropped afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Raw body of `GET /status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_exist: bool,
}

/// Whether the server still needs its first admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthStatus {
    pub setup_required: bool,
}

impl From<StatusResponse> for AuthStatus {
    fn from(resp: StatusResponse) -> Self {
        Self {
            setup_required: !resp.user_exist,
        }
    }
}

/// Body of a successful `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `GET /healthz`. `error` is only set when the server is degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
