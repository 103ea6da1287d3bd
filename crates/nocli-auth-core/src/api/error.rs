use thiserror::Error;

/// The one failure kind the transport layer reports.
///
/// A 401, a 500, a refused connection and a garbled body all surface the same
/// way to callers. `detail` is diagnostic text for logs only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{operation} request failed: {detail}")]
    RequestFailed {
        operation: &'static str,
        detail: String,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(operation: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        let detail = if truncated.is_empty() {
            format!("status {}", status)
        } else {
            format!("status {}: {}", status, truncated)
        };
        ApiError::RequestFailed { operation, detail }
    }

    pub fn from_transport(operation: &'static str, err: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            operation,
            detail: err.to_string(),
        }
    }

    /// Name of the call that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            ApiError::RequestFailed { operation, .. } => operation,
        }
    }
}
