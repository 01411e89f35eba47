//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::UNKNOWN_ERROR_MESSAGE;

/// Main error type for Timeclock
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TimeclockError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Submission(SubmissionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TimeclockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<SubmissionError> for TimeclockError {
    fn from(err: SubmissionError) -> Self {
        Self::Submission(err)
    }
}

/// Result type alias for Timeclock operations
pub type Result<T> = std::result::Result<T, TimeclockError>;

/// Categories of submission failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionErrorKind {
    /// Connection could not be established or was dropped
    Network,
    /// Request or server-side timeout (including HTTP 408)
    Timeout,
    /// Server errors (5xx)
    Server,
    /// Rate limiting (429)
    RateLimit,
    /// Authentication errors (401, 403)
    Auth,
    /// Client errors (4xx except the above), e.g. validation rejections
    Client,
    /// Anything that could not be classified
    Unknown,
}

crate::impl_domain_status_conversions!(SubmissionErrorKind {
    Network => "network",
    Timeout => "timeout",
    Server => "server",
    RateLimit => "rate_limit",
    Auth => "auth",
    Client => "client",
    Unknown => "unknown",
});

/// Failure reported by the remote attendance API.
///
/// Keeps the structured message the API returned (if any) apart from the
/// transport-level description so callers can pick the most useful one.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct SubmissionError {
    kind: SubmissionErrorKind,
    status: Option<u16>,
    api_message: Option<String>,
    message: String,
}

impl SubmissionError {
    pub fn new(kind: SubmissionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            api_message: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SubmissionErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SubmissionErrorKind::Timeout, message)
    }

    /// Classify an HTTP error status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => SubmissionErrorKind::Auth,
            408 => SubmissionErrorKind::Timeout,
            429 => SubmissionErrorKind::RateLimit,
            500..=599 => SubmissionErrorKind::Server,
            400..=499 => SubmissionErrorKind::Client,
            _ => SubmissionErrorKind::Unknown,
        };

        Self {
            kind,
            status: Some(status),
            api_message: None,
            message: message.into(),
        }
    }

    /// Attach the message field from a structured API error body.
    pub fn with_api_message(mut self, api_message: impl Into<String>) -> Self {
        self.api_message = Some(api_message.into());
        self
    }

    pub fn kind(&self) -> SubmissionErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn api_message(&self) -> Option<&str> {
        self.api_message.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Human-readable reason recorded against a queued action.
    ///
    /// Prefers the API's own message, then the generic message, then
    /// [`UNKNOWN_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        [self.api_message.as_deref(), Some(self.message.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(UNKNOWN_ERROR_MESSAGE)
            .to_string()
    }

    /// Check if this error may succeed on a later attempt
    pub fn should_retry(&self) -> bool {
        !self.is_permanent()
    }

    /// Rejections that will not change on retry (validation, conflicts).
    pub fn is_permanent(&self) -> bool {
        self.kind == SubmissionErrorKind::Client
    }

    /// The request never reached the server or the server never answered.
    pub fn is_connectivity(&self) -> bool {
        matches!(self.kind, SubmissionErrorKind::Network | SubmissionErrorKind::Timeout)
    }
}
