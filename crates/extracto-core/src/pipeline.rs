//! Request pipeline: PromptRenderer → CompletionClient → ResponseParser
//!
//! Each request walks `Rendered → Sent → Received → {Parsed | ParseFailed}`
//! exactly once. Nothing is retried here and nothing survives the call.

use crate::completion::{CompletionClient, CompletionError};
use crate::error::{Error, Result};
use crate::parser::ResponseParser;
use crate::prompt::PromptRenderer;
use crate::types::{GenerationOptions, Output, PromptRequest, Record, RequestState, Schema};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Outcome of a single request together with the state it ended in
#[derive(Debug)]
pub struct Execution {
    pub request_id: String,
    /// Last state reached; `None` when rendering failed
    pub state: Option<RequestState>,
    pub result: Result<Output>,
}

/// Tracks the forward-only state machine of one request
struct Lifecycle<'a> {
    request_id: &'a str,
    state: Option<RequestState>,
}

impl<'a> Lifecycle<'a> {
    fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            state: None,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.map_or(next == RequestState::Rendered, |s| s.can_transition_to(next)),
            "illegal transition {:?} -> {}",
            self.state,
            next
        );
        debug!(request_id = self.request_id, state = %next, "Request state changed");
        self.state = Some(next);
    }
}

/// Composes rendering, completion and parsing for one request at a time
///
/// Holds no per-request state, so a single pipeline can serve concurrent
/// requests from an embedding application.
pub struct Pipeline<C> {
    client: C,
    renderer: PromptRenderer,
}

impl<C: CompletionClient> Pipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            renderer: PromptRenderer::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: PromptRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one request and return its output
    pub async fn run(&self, request: &PromptRequest, options: &GenerationOptions) -> Result<Output> {
        self.execute(request, options).await.result
    }

    /// Extract a record for `schema` from a template and its values
    pub async fn extract(
        &self,
        template: &str,
        values: HashMap<String, String>,
        schema: &Schema,
        options: &GenerationOptions,
    ) -> Result<Record> {
        let request = PromptRequest {
            template: template.to_string(),
            values,
            schema: Some(schema.clone()),
        };
        match self.run(&request, options).await? {
            Output::Record(record) => Ok(record),
            Output::Text(text) => Err(Error::parse("expected a structured record", &text)),
        }
    }

    /// Generate free text from a template and its values
    pub async fn generate(
        &self,
        template: &str,
        values: HashMap<String, String>,
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = PromptRequest {
            template: template.to_string(),
            values,
            schema: None,
        };
        match self.run(&request, options).await? {
            Output::Text(text) => Ok(text),
            Output::Record(_) => Err(Error::parse("expected free text", "")),
        }
    }

    /// Run one request, reporting the state it ended in
    pub async fn execute(&self, request: &PromptRequest, options: &GenerationOptions) -> Execution {
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        let mode = if request.schema.is_some() {
            "structured"
        } else {
            "free_text"
        };
        let span = info_span!("request", request_id = %request_id, mode);

        let mut lifecycle = Lifecycle::new(&request_id);
        let result = self
            .drive(request, options, &mut lifecycle)
            .instrument(span)
            .await;
        let state = lifecycle.state;

        Execution {
            request_id,
            state,
            result,
        }
    }

    async fn drive(
        &self,
        request: &PromptRequest,
        options: &GenerationOptions,
        lifecycle: &mut Lifecycle<'_>,
    ) -> Result<Output> {
        let started = Instant::now();

        let prompt = self.renderer.render(request)?;
        lifecycle.advance(RequestState::Rendered);

        lifecycle.advance(RequestState::Sent);
        let completion =
            match tokio::time::timeout(options.timeout, self.client.complete(&prompt, options)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(CompletionError::timeout(format!(
                        "completion did not finish within {:.1}s",
                        options.timeout.as_secs_f64()
                    ))
                    .into())
                }
            };
        lifecycle.advance(RequestState::Received);

        let parser = ResponseParser::for_schema(request.schema.as_ref());
        match parser.parse(&completion.text) {
            Ok(output) => {
                lifecycle.advance(RequestState::Parsed);
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    model = completion.model.as_deref().unwrap_or("unknown"),
                    "Request completed"
                );
                Ok(output)
            }
            Err(err) => {
                lifecycle.advance(RequestState::ParseFailed);
                Err(err)
            }
        }
    }
}
