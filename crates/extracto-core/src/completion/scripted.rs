//! In-memory completion client that replays queued results

use super::{CompletionClient, CompletionError};
use crate::types::{CompletionResult, GenerationOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

type Reply = std::result::Result<CompletionResult, CompletionError>;

/// Completion client returning pre-configured replies in order
///
/// Clones share the same queue and prompt log, so a test can keep a handle
/// while the pipeline owns another.
#[derive(Clone, Default)]
pub struct ScriptedCompletionClient {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that answers once with `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        let client = Self::new();
        client.push_text(text);
        client
    }

    /// Wait this long before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .push_back(Ok(CompletionResult::from_text(text)));
    }

    pub fn push_error(&self, error: CompletionError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of completion calls made so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, prompt: &str, _options: &GenerationOptions) -> Reply {
        self.prompts.lock().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::malformed("no scripted reply available")))
    }
}
