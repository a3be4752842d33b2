//! Text-completion capability
//!
//! The core only depends on [`CompletionClient`]; the HTTP implementation and
//! the scripted fake are interchangeable behind it.

pub mod error;
pub mod http;
pub mod scripted;

pub use error::{CompletionError, CompletionErrorKind};
pub use http::{HttpCompletionClient, ProviderKind, ProviderSettings};
pub use scripted::ScriptedCompletionClient;

use crate::types::{CompletionResult, GenerationOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// Maps a prompt to generated text
///
/// Implementations make at most one network call per invocation and never
/// retry on their own.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<CompletionResult, CompletionError>;
}

#[async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for Arc<C> {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<CompletionResult, CompletionError> {
        (**self).complete(prompt, options).await
    }
}

#[async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<CompletionResult, CompletionError> {
        (**self).complete(prompt, options).await
    }
}
