//! Error types and handling for the CLI
//!
//! Every error maps to a stable process exit code so scripts can tell a bad
//! template from an unreachable endpoint or a model that ignored the schema.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from extracto-core library
    #[error(transparent)]
    Core(#[from] extracto_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        use extracto_core::Error as CoreError;

        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core {
                CoreError::MissingVariable { .. }
                | CoreError::InvalidTemplate { .. }
                | CoreError::InvalidSchema { .. } => 2,
                CoreError::Completion(_) => 3,
                CoreError::Parse { .. } => 4,
                CoreError::Validation { .. } => 5,
                CoreError::Configuration { .. } => 6,
            },
            Self::Config(_) => 6,
            Self::FileNotFound { .. } => 7,
            Self::InvalidFormat { .. } => 8,
            Self::InvalidArgs(_) => 9,
            Self::Json(_) => 10,
            Self::Yaml(_) => 11,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = error.to_string();

    // Name the missing fields and show what the model said, so the prompt can be fixed
    if let Error::Core(core) = error {
        match core {
            extracto_core::Error::Parse { excerpt, .. } if !excerpt.is_empty() => {
                message.push_str(&format!("\n  model output: {}", excerpt));
            }
            extracto_core::Error::Validation { missing, .. } if !missing.is_empty() => {
                message.push_str(&format!("\n  missing fields: {}", missing.join(", ")));
            }
            _ => {}
        }
    }

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extracto_core::{CompletionError, CompletionErrorKind};

    #[test]
    fn test_exit_codes_by_core_category() {
        let missing: Error = extracto_core::Error::MissingVariable {
            name: "country".to_string(),
        }
        .into();
        assert_eq!(missing.exit_code(), 2);

        let completion: Error = extracto_core::Error::from(CompletionError::new(
            CompletionErrorKind::Timeout,
            "slow",
        ))
        .into();
        assert_eq!(completion.exit_code(), 3);

        let validation: Error = extracto_core::Error::Validation {
            message: "missing required fields: allergies".to_string(),
            missing: vec!["allergies".to_string()],
        }
        .into();
        assert_eq!(validation.exit_code(), 5);
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::FileNotFound {
            path: PathBuf::from("record.yaml"),
        };
        assert_eq!(format_error(&err, false), "Error: File not found: record.yaml");
    }

    #[test]
    fn test_format_validation_lists_missing_fields() {
        let err: Error = extracto_core::Error::Validation {
            message: "missing required fields: gender, allergies".to_string(),
            missing: vec!["gender".to_string(), "allergies".to_string()],
        }
        .into();
        let text = format_error(&err, false);
        assert!(text.starts_with("Error: Validation error:"));
        assert!(text.ends_with("missing fields: gender, allergies"));
    }

    #[test]
    fn test_invalid_args_shows_help() {
        assert!(Error::invalid_args("no input").should_show_help());
        assert!(!Error::other("boom").should_show_help());
    }
}
