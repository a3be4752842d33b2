//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables (credentials only)
//!
//! Command-line flags are applied on top by the handlers.

use crate::error::{Error, Result};
use extracto_core::completion::http::{
    DEFAULT_AZURE_API_VERSION, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL,
};
use extracto_core::{GenerationOptions, ProviderKind, ProviderSettings, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion endpoint settings
    pub provider: ProviderConfig,

    /// Defaults for every completion call
    pub generation: GenerationConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// File the configuration was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Completion endpoint configuration
///
/// The API key itself never lives in the file, only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// `openai` or `azure`; endpoint chosen from the environment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderKind>,

    /// OpenAI base URL or Azure resource endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Azure deployment name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// OpenAI model id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Azure API version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Generation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Timeout in seconds for one completion call
    pub timeout_secs: u64,

    /// Retries for transient failures and unparseable replies
    pub max_retries: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = GenerationOptions::default();
        Self {
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: 0,
        }
    }
}

impl GenerationConfig {
    /// Options for the completion call
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Retry policy for the whole request
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

impl ProviderConfig {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Resolve endpoint settings from this section and the process environment
    pub fn settings(&self) -> Result<ProviderSettings> {
        self.settings_with(|name| std::env::var(name).ok())
    }

    /// Resolve endpoint settings through an arbitrary variable lookup
    pub fn settings_with<F>(&self, lookup: F) -> Result<ProviderSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.is_empty() {
            return Ok(ProviderSettings::from_lookup(lookup)?);
        }

        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let kind = self.kind.unwrap_or(if self.deployment.is_some() {
            ProviderKind::Azure
        } else {
            ProviderKind::OpenAi
        });

        let key_env = self.api_key_env.clone().unwrap_or_else(|| match kind {
            ProviderKind::Azure => "AZURE_OPENAI_API_KEY".to_string(),
            ProviderKind::OpenAi => "OPENAI_API_KEY".to_string(),
        });
        let api_key = get(&key_env).ok_or_else(|| {
            Error::config(format!(
                "API key not found for {} endpoint. Set {} environment variable",
                kind, key_env
            ))
        })?;

        let settings = match kind {
            ProviderKind::Azure => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .or_else(|| get("AZURE_OPENAI_ENDPOINT"))
                    .ok_or_else(|| {
                        Error::config(
                            "Azure endpoint missing. Set provider.endpoint or AZURE_OPENAI_ENDPOINT",
                        )
                    })?;
                let deployment = self
                    .deployment
                    .clone()
                    .or_else(|| get("AZURE_OPENAI_DEPLOYMENT"))
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string());
                let api_version = self
                    .api_version
                    .clone()
                    .or_else(|| get("OPENAI_API_VERSION"))
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
                ProviderSettings::azure(endpoint, deployment, api_version, api_key)
            }
            ProviderKind::OpenAi => {
                let base_url = self
                    .endpoint
                    .clone()
                    .or_else(|| get("OPENAI_BASE_URL"))
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
                let model = self
                    .model
                    .clone()
                    .or_else(|| get("OPENAI_MODEL"))
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string());
                ProviderSettings::openai(base_url, model, api_key)
            }
        };

        Ok(settings)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let mut config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) if !path.exists() => Err(Error::FileNotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Default configuration file paths, in lookup order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".extracto.yaml"),
            PathBuf::from(".extracto.json"),
            PathBuf::from("extracto.yaml"),
            PathBuf::from("extracto.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let extracto_dir = config_dir.join("extracto");
            paths.push(extracto_dir.join("config.yaml"));
            paths.push(extracto_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".extracto.yaml"));
            paths.push(home_dir.join(".extracto.json"));
        }

        paths
    }

    /// Location `config init` writes to by default
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("extracto").join("config.yaml"))
    }

    /// Starting point written by `config init`
    pub fn sample() -> Self {
        Self {
            provider: ProviderConfig {
                kind: Some(ProviderKind::OpenAi),
                endpoint: Some(DEFAULT_OPENAI_BASE_URL.to_string()),
                model: Some(DEFAULT_MODEL.to_string()),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                ..Default::default()
            },
            generation: GenerationConfig::default(),
            logging: LoggingConfig {
                level: Some("warn".to_string()),
                format: Some("compact".to_string()),
                file: None,
            },
            source: None,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Whether a path names a YAML document
pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
