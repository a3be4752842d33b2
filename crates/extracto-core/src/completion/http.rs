//! HTTP completion client for OpenAI-compatible and Azure OpenAI endpoints
//!
//! Sends the rendered prompt as a single user message to a chat completion
//! endpoint and returns the first choice's text. One network call per
//! invocation; retries are left to the caller.

use super::{CompletionClient, CompletionError};
use crate::error::{Error, Result};
use crate::types::{CompletionResult, GenerationOptions, TokenUsage};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default Azure OpenAI API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
/// Default model (OpenAI) or deployment (Azure)
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Wire flavour of the chat completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `{base_url}/chat/completions` with a bearer token
    #[serde(rename = "openai")]
    OpenAi,
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions` with an `api-key` header
    Azure,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Azure => write!(f, "azure"),
        }
    }
}

/// Endpoint, model and credentials for the HTTP client
///
/// `Debug` is implemented by hand so the API key never reaches logs.
#[derive(Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// OpenAI base URL or Azure resource endpoint
    pub base_url: String,
    /// Model id (OpenAI) or deployment name (Azure)
    pub model: String,
    /// Azure API version; ignored for OpenAI
    pub api_version: Option<String>,
    api_key: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("api_key", &"***")
            .finish()
    }
}

impl ProviderSettings {
    /// OpenAI-compatible endpoint settings
    pub fn openai(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            base_url: base_url.into(),
            model: model.into(),
            api_version: None,
            api_key: api_key.into(),
        }
    }

    /// Azure OpenAI deployment settings
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: ProviderKind::Azure,
            base_url: endpoint.into(),
            model: deployment.into(),
            api_version: Some(api_version.into()),
            api_key: api_key.into(),
        }
    }

    /// Load settings from the process environment, reading `.env` first
    ///
    /// Azure is selected when `AZURE_OPENAI_ENDPOINT` is set, otherwise an
    /// OpenAI-compatible endpoint is configured from `OPENAI_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
            let api_key = get("AZURE_OPENAI_API_KEY").ok_or_else(|| {
                Error::configuration(
                    "Azure OpenAI API key not found. Set AZURE_OPENAI_API_KEY environment variable",
                )
            })?;
            let api_version =
                get("OPENAI_API_VERSION").unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
            let deployment =
                get("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|| DEFAULT_MODEL.to_string());
            return Ok(Self::azure(endpoint, deployment, api_version, api_key));
        }

        let api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            Error::configuration(
                "No completion endpoint configured. Set AZURE_OPENAI_ENDPOINT or OPENAI_API_KEY",
            )
        })?;
        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        let model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self::openai(base_url, model, api_key))
    }

    /// Replace the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Full URL of the chat completion endpoint
    pub fn endpoint_url(&self) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let raw = match self.kind {
            ProviderKind::OpenAi => format!("{}/chat/completions", base),
            ProviderKind::Azure => format!(
                "{}/openai/deployments/{}/chat/completions",
                base, self.model
            ),
        };

        let mut url = Url::parse(&raw).map_err(|e| Error::Configuration {
            message: format!("Invalid endpoint URL '{}': {}", raw, e),
            source: Some(e.into()),
        })?;

        if self.kind == ProviderKind::Azure {
            let version = self
                .api_version
                .as_deref()
                .unwrap_or(DEFAULT_AZURE_API_VERSION);
            url.query_pairs_mut().append_pair("api-version", version);
        }

        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Decode a chat completion body into a completion result
fn decode_chat_response(body: &str) -> std::result::Result<CompletionResult, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::malformed(format!("Response is not a chat completion: {}", e)))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| CompletionError::malformed("Response has no message content"))?;

    Ok(CompletionResult {
        text,
        model: response.model,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

/// Chat completion client over HTTP
pub struct HttpCompletionClient {
    client: ReqwestClient,
    settings: ProviderSettings,
    url: Url,
}

impl HttpCompletionClient {
    /// Create a client, validating the endpoint and credentials up front
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        if !settings.has_api_key() {
            return Err(Error::configuration(format!(
                "API key missing for {} endpoint {}",
                settings.kind, settings.base_url
            )));
        }

        let url = settings.endpoint_url()?;
        let client = ReqwestClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;

        Ok(Self {
            client,
            settings,
            url,
        })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ProviderSettings::from_env()?)
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    #[instrument(skip_all, fields(provider = %self.settings.kind, model = %self.settings.model))]
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<CompletionResult, CompletionError> {
        let body = ChatRequest {
            model: match self.settings.kind {
                ProviderKind::OpenAi => Some(self.settings.model.as_str()),
                ProviderKind::Azure => None,
            },
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let request = self
            .client
            .post(self.url.clone())
            .timeout(options.timeout)
            .json(&body);
        let request = match self.settings.kind {
            ProviderKind::OpenAi => request.bearer_auth(&self.settings.api_key),
            ProviderKind::Azure => request.header("api-key", &self.settings.api_key),
        };

        debug!(prompt_bytes = prompt.len(), "Sending completion request");
        let response = request
            .send()
            .await
            .map_err(CompletionError::from_request_error)?;

        if !response.status().is_success() {
            return Err(CompletionError::from_response(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(CompletionError::from_request_error)?;
        let result = decode_chat_response(&body)?;

        debug!(
            response_bytes = result.text.len(),
            usage = ?result.usage,
            "Received completion"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionErrorKind;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_azure_settings_from_lookup() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
            ("AZURE_OPENAI_API_KEY", "secret-key"),
            ("OPENAI_API_VERSION", "2024-02-01"),
        ]))
        .unwrap();

        assert_eq!(settings.kind, ProviderKind::Azure);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(
            settings.endpoint_url().unwrap().as_str(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_azure_requires_key() {
        let err = ProviderSettings::from_lookup(lookup(&[(
            "AZURE_OPENAI_ENDPOINT",
            "https://example.openai.azure.com",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));
    }

    #[test]
    fn test_openai_settings_defaults() {
        let settings =
            ProviderSettings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(settings.kind, ProviderKind::OpenAi);
        assert_eq!(
            settings.endpoint_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_no_settings_is_configuration_error() {
        let err = ProviderSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = ProviderSettings::openai(DEFAULT_OPENAI_BASE_URL, "gpt-4o", "sk-very-secret");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = ProviderSettings::openai("not a url", "gpt-4o", "sk");
        assert!(matches!(
            settings.endpoint_url().unwrap_err(),
            Error::Configuration { .. }
        ));
    }

    #[test]
    fn test_client_requires_api_key() {
        let settings = ProviderSettings::openai(DEFAULT_OPENAI_BASE_URL, "gpt-4o", "");
        assert!(HttpCompletionClient::new(settings).is_err());
    }

    #[test]
    fn test_decode_chat_response() {
        let body = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello world"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
        }"#;
        let result = decode_chat_response(body).unwrap();
        assert_eq!(result.text, "Hello world");
        assert_eq!(result.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(
            result.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 2
            })
        );
    }

    #[test]
    fn test_decode_rejects_missing_content() {
        let err = decode_chat_response(r#"{"choices": []}"#).unwrap_err();
        assert_eq!(err.kind, CompletionErrorKind::MalformedResponse);

        let err = decode_chat_response("<html>gateway</html>").unwrap_err();
        assert_eq!(err.kind, CompletionErrorKind::MalformedResponse);
    }
}
