//! Core data types for Extracto
//!
//! Everything here is constructed per request and discarded once the request
//! returns. Schemas are declared explicitly by the caller, either in code or
//! from YAML/JSON files.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// A single field an extraction must populate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key of the field in the structured payload
    pub name: String,
    /// Human description, only used for prompting
    #[serde(default)]
    pub description: String,
    /// Whether the payload must contain the field
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    /// Declare a required field
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    /// Declare an optional field
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Ordered set of fields with unique names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDef", into = "SchemaDef")]
pub struct Schema {
    name: Option<String>,
    fields: Vec<FieldSpec>,
}

/// Serialized form of a schema, validated on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    fields: Vec<FieldSpec>,
}

impl TryFrom<SchemaDef> for Schema {
    type Error = Error;

    fn try_from(def: SchemaDef) -> Result<Self> {
        let schema = Schema::new(def.fields)?;
        Ok(match def.name {
            Some(name) => schema.with_name(name),
            None => schema,
        })
    }
}

impl From<Schema> for SchemaDef {
    fn from(schema: Schema) -> Self {
        SchemaDef {
            name: schema.name,
            fields: schema.fields,
        }
    }
}

impl Schema {
    /// Create a schema, rejecting empty or duplicate field names
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(Error::InvalidSchema {
                    message: "field names must not be empty".to_string(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema {
                    message: format!("duplicate field name '{}'", field.name),
                });
            }
        }

        Ok(Self { name: None, fields })
    }

    /// Attach a display name, used in format instructions
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the required fields, in declaration order
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Values extracted for a schema, in schema order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: IndexMap<String, String>,
    dropped_keys: Vec<String>,
}

impl Record {
    pub(crate) fn new(values: IndexMap<String, String>, dropped_keys: Vec<String>) -> Self {
        Self {
            values,
            dropped_keys,
        }
    }

    /// Value of a field, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Field names present in the record, in schema order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Name/value pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys the model returned that the schema does not declare
    pub fn dropped_keys(&self) -> &[String] {
        &self.dropped_keys
    }

    pub fn into_map(self) -> IndexMap<String, String> {
        self.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Everything needed to render one prompt
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    /// Template text with `{name}` placeholders
    pub template: String,
    /// Placeholder values
    pub values: HashMap<String, String>,
    /// Target schema; `None` selects free-text mode
    pub schema: Option<Schema>,
}

impl PromptRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            values: HashMap::new(),
            schema: None,
        }
    }

    /// Supply a placeholder value
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Supply several placeholder values
    pub fn with_values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Request structured output for the given schema
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Token accounting reported by the completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Raw output of a completion call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Generated text, opaque to the core
    pub text: String,
    /// Model that served the request, when reported
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl CompletionResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: None,
        }
    }
}

/// Default bound on a single completion call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Generation settings for a single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens; endpoint default when `None`
    pub max_tokens: Option<u32>,
    /// Sampling temperature; `0.0` asks for deterministic output
    pub temperature: Option<f32>,
    /// Bound on the whole completion call
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: Some(0.0),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GenerationOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Progress of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Rendered,
    Sent,
    Received,
    Parsed,
    ParseFailed,
}

impl RequestState {
    /// Whether `next` may follow `self`
    pub fn can_transition_to(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (RequestState::Rendered, RequestState::Sent)
                | (RequestState::Sent, RequestState::Received)
                | (RequestState::Received, RequestState::Parsed)
                | (RequestState::Received, RequestState::ParseFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Parsed | RequestState::ParseFailed)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Rendered => write!(f, "rendered"),
            RequestState::Sent => write!(f, "sent"),
            RequestState::Received => write!(f, "received"),
            RequestState::Parsed => write!(f, "parsed"),
            RequestState::ParseFailed => write!(f, "parse_failed"),
        }
    }
}

/// Result of a completed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    /// Free-text mode
    Text(String),
    /// Structured mode
    Record(Record),
}

impl Output {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Output::Record(record) => Some(record),
            Output::Text(_) => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Output::Record(record) => Some(record),
            Output::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Output::Text(text) => Some(text),
            Output::Record(_) => None,
        }
    }
}
