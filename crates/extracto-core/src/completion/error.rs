//! Completion failure classification
//!
//! Normalizes transport and endpoint failures into a small set of kinds the
//! caller can base its retry decision on.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of completion failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionErrorKind {
    /// The call exceeded its time budget
    Timeout,
    /// Credentials missing or rejected (401/403)
    Authentication,
    /// The endpoint asked us to slow down (429)
    RateLimited,
    /// The endpoint answered, but not with a usable completion
    MalformedResponse,
    /// Connection could not be established or was dropped
    Network,
    /// Server-side failure (5xx)
    Server,
    /// Request rejected for another reason (other 4xx)
    Client,
}

impl CompletionErrorKind {
    /// Check if a failure of this kind is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionErrorKind::Timeout
                | CompletionErrorKind::RateLimited
                | CompletionErrorKind::Network
                | CompletionErrorKind::Server
        )
    }

    /// Classify an HTTP status code
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => CompletionErrorKind::Authentication,
            408 => CompletionErrorKind::Timeout,
            429 => CompletionErrorKind::RateLimited,
            400..=499 => CompletionErrorKind::Client,
            _ => CompletionErrorKind::Server,
        }
    }
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionErrorKind::Timeout => write!(f, "timeout"),
            CompletionErrorKind::Authentication => write!(f, "authentication"),
            CompletionErrorKind::RateLimited => write!(f, "rate limited"),
            CompletionErrorKind::MalformedResponse => write!(f, "malformed response"),
            CompletionErrorKind::Network => write!(f, "network"),
            CompletionErrorKind::Server => write!(f, "server"),
            CompletionErrorKind::Client => write!(f, "client"),
        }
    }
}

/// Failure of a single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionError {
    pub kind: CompletionErrorKind,
    /// HTTP status code if the endpoint answered
    pub status_code: Option<u16>,
    /// Human-readable error message
    pub message: String,
    /// Retry-After header value in seconds, if present
    pub retry_after: Option<u64>,
}

impl CompletionError {
    pub fn new(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::MalformedResponse, message)
    }

    /// Create from an unsuccessful HTTP response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body).unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

        Self {
            kind: CompletionErrorKind::from_status(status),
            status_code: Some(status.as_u16()),
            message,
            retry_after,
        }
    }

    /// Create from a transport-level error
    pub fn from_request_error(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            CompletionErrorKind::Timeout
        } else if error.is_connect() || error.is_request() {
            CompletionErrorKind::Network
        } else if error.is_decode() || error.is_body() {
            CompletionErrorKind::MalformedResponse
        } else {
            CompletionErrorKind::Network
        };

        Self {
            kind,
            status_code: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
            retry_after: None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Pull the message out of an OpenAI/Azure style error body
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| json.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Completion failed ({}, HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "Completion failed ({}): {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for CompletionError {}
