//! Structured Adapter Failures
//!
//! Every outbound call is normalized into a [`Failure`] before its outcome is
//! fed back into a machine. Raw transport errors never reach machine context.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// Failure class, derived from the HTTP status or the transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Request rejected by client-side rules or a 4xx response
    Validation,
    /// Session missing or invalid (401/403)
    Authorization,
    /// 5xx or a malformed response body
    Server,
    /// Connection refused, reset, DNS ...
    Network,
    /// Request did not complete within the configured timeout
    Timeout,
}

impl FailureKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureKind::Authorization,
            400..=499 => FailureKind::Validation,
            _ => FailureKind::Server,
        }
    }

    /// Get the error code for logs and notices
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "VALIDATION",
            FailureKind::Authorization => "AUTHORIZATION",
            FailureKind::Server => "SERVER",
            FailureKind::Network => "NETWORK",
            FailureKind::Timeout => "TIMEOUT",
        }
    }

    /// Network, timeout and server failures may succeed on an explicit retry
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::Network | FailureKind::Timeout | FailureKind::Server
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized failure of an adapter call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    /// HTTP status when the server answered
    pub status: Option<u16>,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Build a failure from a non-success HTTP response
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Authorization, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Server, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    #[inline]
    pub fn is_authorization(&self) -> bool {
        self.kind == FailureKind::Authorization
    }

    #[inline]
    pub fn is_validation(&self) -> bool {
        self.kind == FailureKind::Validation
    }
}

impl From<ValidationError> for Failure {
    fn from(e: ValidationError) -> Self {
        Failure::validation(e.to_string())
    }
}

impl From<reqwest::Error> for Failure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Failure::timeout(e.to_string());
        }
        if let Some(status) = e.status() {
            return Failure::from_status(status.as_u16(), e.to_string());
        }
        if e.is_decode() || e.is_body() {
            return Failure::server(format!("Malformed response: {}", e));
        }
        Failure::network(e.to_string())
    }
}
