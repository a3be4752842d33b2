//! Error types for the Extracto core library
//!
//! Every failure aborts the single request it belongs to. The variants map
//! onto the caller's recovery options: template and schema mistakes are bugs
//! in the calling code, completion failures may be transient, and parse or
//! validation failures describe what the model actually returned.

use crate::completion::CompletionError;
use thiserror::Error;

/// Main error type for Extracto operations
#[derive(Error, Debug)]
pub enum Error {
    /// A template placeholder had no value supplied
    #[error("Missing value for template variable '{name}'")]
    MissingVariable { name: String },

    /// Template text could not be parsed into literals and placeholders
    #[error("Invalid template at byte {position}: {message}")]
    InvalidTemplate { message: String, position: usize },

    /// Schema declaration violates its invariants
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    /// The completion capability failed
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// No structured payload could be located in the model output
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        /// Leading fragment of the offending output, for diagnostics
        excerpt: String,
    },

    /// A payload was found but does not satisfy the schema
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        /// Required fields absent from the payload
        missing: Vec<String>,
    },

    /// Endpoint or credential settings are unusable
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Longest excerpt of model output kept on a parse error
const EXCERPT_LEN: usize = 120;

impl Error {
    /// Build a parse error, keeping a short excerpt of the offending text
    pub fn parse(message: impl Into<String>, text: &str) -> Self {
        let excerpt = match text.char_indices().nth(EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        };
        Error::Parse {
            message: message.into(),
            excerpt,
        }
    }

    /// Build a configuration error without an underlying source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether re-running the whole request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Completion(err) => err.is_retryable(),
            Error::Parse { .. } => true,
            _ => false,
        }
    }

    /// Short stable name of the error category
    pub fn category(&self) -> &'static str {
        match self {
            Error::MissingVariable { .. } => "missing_variable",
            Error::InvalidTemplate { .. } => "invalid_template",
            Error::InvalidSchema { .. } => "invalid_schema",
            Error::Completion(_) => "completion",
            Error::Parse { .. } => "parse",
            Error::Validation { .. } => "validation",
            Error::Configuration { .. } => "configuration",
        }
    }
}
