//! API client for the docker-nocli management server.
//!
//! Covers the unauthenticated bootstrap endpoints (`/status`, `/auth/setup`,
//! `/auth/token`) plus `/healthz`. A client built with [`ApiClient::with_token`]
//! attaches the bearer token to everything it sends.

use anyhow::Result;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{AuthStatus, Credentials, HealthResponse, LoginResponse, StatusResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const STATUS_PATH: &str = "/status";
const SETUP_PATH: &str = "/auth/setup";
const TOKEN_PATH: &str = "/auth/token";
const HEALTH_PATH: &str = "/healthz";

const OP_STATUS: &str = "fetch auth status";
const OP_SETUP: &str = "setup admin";
const OP_LOGIN: &str = "login";
const OP_HEALTH: &str = "health check";

/// API client for the management server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for `base_url`.
    ///
    /// No request timeout is set: a request that never answers keeps its
    /// caller waiting.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    /// Same client with any bearer token dropped.
    pub fn without_token(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // ===== Endpoints =====

    /// Ask the server whether an admin account exists yet.
    ///
    /// A body without `user_exist` counts as "no user", i.e. setup required.
    pub async fn fetch_status(&self) -> Result<AuthStatus, ApiError> {
        let response = self
            .send(OP_STATUS, self.request(Method::GET, STATUS_PATH))
            .await?;
        let response = Self::check_response(OP_STATUS, response).await?;
        let body: StatusResponse = Self::decode(OP_STATUS, response).await?;
        debug!(user_exist = body.user_exist, "Auth status fetched");
        Ok(body.into())
    }

    /// Create the initial admin account.
    pub async fn setup_admin(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = Credentials { username, password };
        let response = self
            .send(OP_SETUP, self.request(Method::POST, SETUP_PATH).json(&body))
            .await?;
        Self::check_response(OP_SETUP, response).await?;
        debug!(username, "Admin account created");
        Ok(())
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Credentials { username, password };
        let response = self
            .send(OP_LOGIN, self.request(Method::POST, TOKEN_PATH).json(&body))
            .await?;
        let response = Self::check_response(OP_LOGIN, response).await?;
        Self::decode(OP_LOGIN, response).await
    }

    /// Query server health.
    ///
    /// The server answers 503 with a JSON body when a dependency is down, so
    /// that status is decoded like a 200 rather than treated as a failure.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .send(OP_HEALTH, self.request(Method::GET, HEALTH_PATH))
            .await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Self::decode(OP_HEALTH, response).await;
        }
        let response = Self::check_response(OP_HEALTH, response).await?;
        Self::decode(OP_HEALTH, response).await
    }

    // ===== Plumbing =====

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, ApiError> {
        request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(operation, e))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(operation: &'static str, response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(operation, %status, "Request rejected");
            Err(ApiError::from_status(operation, status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::from_transport(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri()).expect("client should build")
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8193/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8193");
        assert_eq!(client.url("/status"), "http://localhost:8193/status");
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::new("http://localhost:8193").unwrap();
        let authed = client.with_token("tok".to_string());
        assert!(authed.has_token());
        assert!(!client.has_token());
        assert_eq!(authed.base_url(), client.base_url());
        assert!(!authed.without_token().has_token());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::new("http://localhost:8193")
            .unwrap()
            .with_token("secret-token".to_string());
        let text = format!("{:?}", client);
        assert!(!text.contains("secret-token"));
        assert!(text.contains("authenticated: true"));
    }

    #[tokio::test]
    async fn test_fetch_status_user_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "user_exist": true})))
            .mount(&server)
            .await;

        let status = client_for(&server).await.fetch_status().await.unwrap();
        assert!(!status.setup_required);
    }

    #[tokio::test]
    async fn test_fetch_status_missing_field_requires_setup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let status = client_for(&server).await.fetch_status().await.unwrap();
        assert!(status.setup_required);
    }

    #[tokio::test]
    async fn test_fetch_status_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_status().await.unwrap_err();
        assert_eq!(err.operation(), "fetch auth status");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_status_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).await.fetch_status().await;
        assert!(matches!(result, Err(ApiError::RequestFailed { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_failed() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        drop(server);

        let result = client.fetch_status().await;
        assert!(matches!(result, Err(ApiError::RequestFailed { operation: "fetch auth status", .. })));
    }

    #[tokio::test]
    async fn test_setup_admin_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/setup"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"username": "admin", "password": "pw"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).await.setup_admin("admin", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_setup_admin_conflict_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/setup"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = client_for(&server).await.setup_admin("admin", "pw").await.unwrap_err();
        assert_eq!(err.operation(), "setup admin");
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .and(body_json(json!({"username": "admin", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok123"})))
            .mount(&server)
            .await;

        let resp = client_for(&server).await.login("admin", "pw").await.unwrap();
        assert_eq!(resp.token, "tok123");
    }

    #[tokio::test]
    async fn test_login_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad credentials"})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.login("admin", "wrong").await.unwrap_err();
        assert_eq!(err.operation(), "login");
    }

    #[tokio::test]
    async fn test_login_body_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "tok"})))
            .mount(&server)
            .await;

        assert!(client_for(&server).await.login("admin", "pw").await.is_err());
    }

    #[tokio::test]
    async fn test_health_ok_and_degraded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"status": "degraded", "error": "docker unreachable"})),
            )
            .mount(&server)
            .await;

        let health = client_for(&server).await.health().await.unwrap();
        assert!(!health.is_ok());
        assert_eq!(health.error.as_deref(), Some("docker unreachable"));
    }

    #[tokio::test]
    async fn test_health_other_errors_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(client_for(&server).await.health().await.is_err());
    }

    #[tokio::test]
    async fn test_with_token_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .and(header("authorization", "Bearer tok123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await.with_token("tok123".to_string());
        assert!(client.health().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_plain_client_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_exist": true})))
            .mount(&server)
            .await;

        assert!(client_for(&server).await.fetch_status().await.is_ok());
    }
}
