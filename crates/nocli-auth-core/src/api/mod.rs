//! REST API client module for the docker-nocli management server.
//!
//! This module provides the `ApiClient` used to check whether the server has
//! been bootstrapped, create the first admin account, and exchange credentials
//! for a bearer token.
//!
//! Every failure is reported as `ApiError::RequestFailed`; callers cannot and
//! should not tell a 401 apart from a dropped connection.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
