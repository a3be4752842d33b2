//! Shared utilities for command handlers

use crate::cli::GenerationArgs;
use crate::config::{is_yaml, Config};
use crate::error::{Error, Result};
use extracto_core::{GenerationOptions, HttpCompletionClient, RetryPolicy, Schema};
use is_terminal::IsTerminal;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Placeholder that receives the input document
pub const QUERY_VAR: &str = "query";

/// Read a file, reporting a missing path distinctly
pub fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "Read file");
    Ok(content)
}

/// Load a schema declaration from a YAML or JSON file
pub fn load_schema(path: &Path) -> Result<Schema> {
    let content = read_file(path)?;

    // Declaration errors (empty, duplicate names) surface as serde messages
    let schema = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("YAML schema ({})", e),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("JSON schema ({})", e),
        })?
    };

    Ok(schema)
}

/// Read the input document from a file, or from stdin when it is piped
pub fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return read_file(path);
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(Error::invalid_args(
            "no input document; pass --input <FILE> or pipe the document on stdin",
        ));
    }

    let mut content = String::new();
    stdin.read_to_string(&mut content)?;
    Ok(content)
}

/// Merge `--var` bindings with an optional input document
///
/// An input document always wins over a `--var query=...` binding.
pub fn placeholder_values(
    vars: Vec<(String, String)>,
    document: Option<String>,
) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = vars.into_iter().collect();
    if let Some(document) = document {
        values.insert(QUERY_VAR.to_string(), document);
    }
    values
}

/// Generation options and retry policy from configuration plus flag overrides
pub fn generation_settings(
    config: &Config,
    args: &GenerationArgs,
) -> (GenerationOptions, RetryPolicy) {
    let mut options = config.generation.options();
    if let Some(temperature) = args.temperature {
        options.temperature = Some(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        options.max_tokens = Some(max_tokens);
    }
    if let Some(timeout) = args.timeout {
        options.timeout = Duration::from_secs(timeout);
    }

    let mut policy = config.generation.retry_policy();
    if let Some(max_retries) = args.max_retries {
        policy.max_retries = max_retries;
    }

    (options, policy)
}

/// HTTP completion client for the configured endpoint
pub fn build_client(config: &Config) -> Result<HttpCompletionClient> {
    let settings = config.provider.settings()?;
    debug!(settings = ?settings, "Resolved completion endpoint");
    Ok(HttpCompletionClient::new(settings)?)
}

/// Save a serializable value as YAML or pretty JSON, by file extension
pub fn save_as<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    fs::write(path, content)?;
    Ok(())
}
