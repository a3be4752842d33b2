//! Extracto Core - schema-constrained extraction over LLM completions
//!
//! A request flows through three components:
//!
//! - **PromptRenderer**: fills a template's `{name}` placeholders and, for
//!   structured extraction, injects formatting instructions for the schema
//! - **CompletionClient**: sends the prompt to a text-completion capability
//! - **ResponseParser**: returns free text unchanged, or locates a JSON object
//!   in the reply and validates it into a [`Record`]
//!
//! # Example
//!
//! ```no_run
//! use extracto_core::{
//!     FieldSpec, GenerationOptions, HttpCompletionClient, Pipeline, PromptRequest, Schema,
//! };
//!
//! async fn example() -> extracto_core::Result<()> {
//!     let schema = Schema::new(vec![
//!         FieldSpec::required("patient_name", "name of the patient"),
//!         FieldSpec::required("date_of_birth", "date of birth of the patient"),
//!     ])?;
//!
//!     let pipeline = Pipeline::new(HttpCompletionClient::from_env()?);
//!     let request = PromptRequest::new(
//!         "Extract the necessary details from the medical record.\n{format_instructions}\n{query}\n",
//!     )
//!     .with_value("query", "Patient Name: John Doe\nDate of Birth: 1985-06-15")
//!     .with_schema(schema);
//!
//!     let output = pipeline.run(&request, &GenerationOptions::default()).await?;
//!     println!("{:?}", output);
//!     Ok(())
//! }
//! ```

pub mod completion;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod retry;
pub mod types;

// Re-export main types for convenience
pub use completion::{
    CompletionClient, CompletionError, CompletionErrorKind, HttpCompletionClient, ProviderKind,
    ProviderSettings, ScriptedCompletionClient,
};
pub use error::{Error, Result};
pub use parser::ResponseParser;
pub use pipeline::{Execution, Pipeline};
pub use prompt::{format_instructions, PromptRenderer, PromptTemplate};
pub use retry::{retry_request, RetryPolicy};
pub use types::{
    CompletionResult, FieldSpec, GenerationOptions, Output, PromptRequest, Record, RequestState,
    Schema, TokenUsage,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
