//!
//! # Client Error Handling
//!
//! This module defines `ApiError`, the single error type surfaced by the request
//! gateway and everything built on top of it (endpoint wrappers, the session
//! controller). Every non-2xx response, transport failure or client-side validation
//! failure becomes an `ApiError` carrying a human-readable message, the HTTP status
//! when one was received, and the parsed error body when there was one.
//!
//! `ErrorKind` classifies an error into the categories the session controller reacts
//! to: authentication failures degrade the session, everything else is surfaced.
//!
//! `ConfigError` covers malformed environment configuration.

use serde_json::Value;
use std::fmt;
use validator::ValidationErrors;

/// Broad category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced an HTTP response (unreachable host, timeout).
    Transport,
    /// The server rejected the credentials (401/403).
    Authentication,
    /// The request was rejected as invalid (400/404/409/422) or failed client-side validation.
    Validation,
    /// The server failed (5xx).
    Server,
    /// Any other non-success status.
    Client,
}

/// Typed error returned by the API gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Human-readable message, suitable for showing to a user as-is.
    pub message: String,
    /// HTTP status of the response, `None` for transport and client-side failures.
    pub status: Option<u16>,
    /// Parsed JSON error body (or validation field errors), when available.
    pub details: Option<Value>,
    /// Category of an error raised without an HTTP response.
    origin: ErrorKind,
}

impl ApiError {
    /// Error built from a non-success HTTP response.
    pub fn http(status: u16, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            details,
            origin: ErrorKind::Client,
        }
    }

    /// Error raised before any response was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
            origin: ErrorKind::Transport,
        }
    }

    /// Error raised by client-side input validation.
    pub fn validation(message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details,
            origin: ErrorKind::Validation,
        }
    }

    /// The session cannot be (re)established without signing in again.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
            origin: ErrorKind::Authentication,
        }
    }

    /// An authentication request is already running on the same session.
    pub fn in_progress() -> Self {
        Self {
            message: "Another authentication request is already in progress".to_string(),
            status: None,
            details: None,
            origin: ErrorKind::Client,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            None => self.origin,
            Some(401) | Some(403) => ErrorKind::Authentication,
            Some(400) | Some(404) | Some(409) | Some(422) => ErrorKind::Validation,
            Some(s) if s >= 500 => ErrorKind::Server,
            Some(_) => ErrorKind::Client,
        }
    }

    /// True when the bearer credentials were not accepted: the server answered 401, or
    /// there was nothing left to present.
    pub fn is_unauthorized(&self) -> bool {
        match self.status {
            Some(status) => status == 401,
            None => self.origin == ErrorKind::Authentication,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts `reqwest::Error` into a transport-level `ApiError`.
///
/// Status-bearing reqwest errors only arise from `error_for_status`, which the gateway
/// never uses, so the status is carried along only if present.
impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> ApiError {
        let message = if error.is_timeout() {
            "Request timed out".to_string()
        } else if error.is_connect() {
            "Unable to reach the server".to_string()
        } else if error.is_decode() {
            format!("Failed to decode response: {}", error)
        } else {
            format!("Request failed: {}", error)
        };
        match error.status() {
            Some(status) => ApiError::http(status.as_u16(), message, None),
            None => ApiError::transport(message),
        }
    }
}

/// Converts `validator::ValidationErrors` into a validation `ApiError`.
///
/// The field errors are kept as structured details.
impl From<ValidationErrors> for ApiError {
    fn from(error: ValidationErrors) -> ApiError {
        let details = serde_json::to_value(error.field_errors()).ok();
        ApiError::validation(error.to_string(), details)
    }
}

/// Errors raised while reading client configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => {
                write!(f, "Invalid value for {}: {:?}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
