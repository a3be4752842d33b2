//! Logging utilities for the Extracto CLI
//!
//! This module provides:
//! - Session ID generation and tracking
//! - Sensitive data redaction
//! - Performance timing spans
//! - Structured logging setup (console, file, JSON)

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global ID for the current CLI session
static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply the `logging` section of the configuration file
    ///
    /// The file level only counts when no `-v` flag raised verbosity.
    pub fn merge_with_file(&mut self, file: &crate::config::LoggingConfig, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = &file.level {
                self.level = level.clone();
            }
        }
        if let Some(format) = file.format.as_deref().and_then(LogFormat::parse) {
            self.format = format;
        }
        if file.file.is_some() {
            self.file = file.file.clone();
        }
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        self.merge_with_lookup(|name| std::env::var(name).ok());
    }

    fn merge_with_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // RUST_LOG takes precedence
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup("EXTRACTO_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Warning: invalid log format '{}', using default", format),
            }
        }

        if let Some(file) = lookup("EXTRACTO_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }

        if let Some(console) = lookup("EXTRACTO_LOG_CONSOLE") {
            self.console = console.to_lowercase() == "true" || console == "1";
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let (writer, ansi) = match &config.file {
        Some(path) => (file_writer(path)?, false),
        None if config.console => (
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ),
        None => (BoxMakeWriter::new(std::io::sink), false),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Each format yields a different subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(
            builder
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .json()
                .finish(),
        ),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let session_id = SESSION_ID.get_or_init(generate_session_id);
    tracing::debug!(
        session_id = %session_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

fn file_writer(path: &std::path::Path) -> Result<BoxMakeWriter> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Log file path has no file name: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(BoxMakeWriter::new(tracing_appender::rolling::never(dir, file_name)))
}

/// Generate a unique ID for this CLI session
pub fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

/// Get the current session ID
pub fn current_session_id() -> Option<&'static str> {
    SESSION_ID.get().map(|s| s.as_str())
}

/// Create a span with session ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        session_id = current_session_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static SECRET_REGEX: OnceLock<Regex> = OnceLock::new();

    fn secret_regex() -> &'static Regex {
        SECRET_REGEX.get_or_init(|| {
            Regex::new(
                r#"(?i)(api[_-]?key|apikey|token|bearer|password|passwd|pwd)([=:\s]+)['"]?([a-zA-Z0-9_.\-]{6,})['"]?"#,
            )
            .expect("secret pattern is valid")
        })
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        secret_regex().replace_all(input, "$1$2***").to_string()
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            serde_json::Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    /// Check if a JSON key names a secret
    ///
    /// `api_key_env` only names a variable, so it is left visible.
    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        if key_lower.ends_with("_env") {
            return false;
        }
        key_lower.contains("key")
            || key_lower.contains("token")
            || key_lower.contains("password")
            || key_lower.contains("secret")
            || key_lower.contains("credential")
            || key_lower.contains("auth")
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }

        /// Get elapsed time without finishing the timer
        pub fn elapsed(&self) -> std::time::Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_redaction() {
        let input = "api_key=sk-1234567890abcdef token=bearer_xyz password=secret123";
        let redacted = redaction::redact_sensitive(input);
        assert!(redacted.contains("api_key=***"));
        assert!(redacted.contains("token=***"));
        assert!(redacted.contains("password=***"));
        assert!(!redacted.contains("sk-1234567890abcdef"));
        assert!(!redacted.contains("bearer_xyz"));
        assert!(!redacted.contains("secret123"));
    }

    #[test]
    fn test_json_redaction() {
        let mut value = serde_json::json!({
            "api_key": "sk-1234567890abcdef",
            "api_key_env": "OPENAI_API_KEY",
            "model": "gpt-4o-mini",
            "headers": {
                "authorization": "Bearer token123"
            }
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["api_key"], "***");
        assert_eq!(value["api_key_env"], "OPENAI_API_KEY");
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["headers"]["authorization"], "***");
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_file_settings_yield_to_verbosity() {
        let file = crate::config::LoggingConfig {
            level: Some("info".to_string()),
            format: Some("json".to_string()),
            file: None,
        };

        let mut config = LoggingConfig::from_verbosity(2);
        config.merge_with_file(&file, 2);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let mut config = LoggingConfig::from_verbosity(0);
        config.merge_with_file(&file, 0);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RUST_LOG", "extracto_core=trace"),
            ("EXTRACTO_LOG_FORMAT", "JSON"),
            ("EXTRACTO_LOG_FILE", "/tmp/extracto.log"),
        ]);
        let mut config = LoggingConfig::default();
        config.merge_with_lookup(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.level, "extracto_core=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/extracto.log")));
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("sess_"));
        assert_eq!(id.len(), "sess_".len() + 32);
    }
}
