//! Language model seam.
//!
//! Two layers, selected by configuration rather than model-name sniffing:
//!
//! 1. [`CompletionClient`] — a raw chat-completion capability, implemented
//!    per provider in [`providers`].
//! 2. [`StructuredGenerator`] — what the pipeline actually consumes: an
//!    opaque `generate(prompt, shape) -> raw structured artifact` call.
//!    [`StructuredClient`] adapts any completion client by attaching the
//!    per-shape system prompt and JSON response mode. The artifact may still
//!    carry a markdown code fence; [`crate::parse`] strips it.

pub mod providers;

use crate::prompts;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Completion layer
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    /// Request a JSON object response where the provider supports it.
    pub json_mode: bool,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
    pub model: String,
}

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

#[derive(Debug, Clone, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    Api(String),
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Raw chat-completion capability of a provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError>;
}

// ============================================================================
// Structured generation layer
// ============================================================================

/// The shape of artifact a structured generation call must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputShape {
    /// A question-pruned `GraphSchema` subset.
    PrunedSchema,
    /// A `{"query": ...}` envelope holding a single-line query.
    Query,
    /// A `{"response": ...}` envelope holding a natural language answer.
    Answer,
}

/// Opaque structured generation: prompt in, raw artifact text out. The text
/// is expected to parse as the requested [`OutputShape`] after fence
/// stripping, but callers own that parsing (and its failure handling).
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: OutputShape,
    ) -> Result<String, LLMError>;
}

/// Adapts a [`CompletionClient`] into a [`StructuredGenerator`] by pairing
/// each shape with its system prompt and requesting JSON output.
pub struct StructuredClient<C> {
    client: Arc<C>,
    temperature: Option<f32>,
}

impl<C: CompletionClient> StructuredClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            temperature: Some(0.2),
        }
    }

    pub fn temperature(mut self, t: Option<f32>) -> Self {
        self.temperature = t;
        self
    }

    fn system_prompt(shape: OutputShape) -> &'static str {
        match shape {
            OutputShape::PrunedSchema => prompts::PRUNE_SYSTEM_PROMPT,
            OutputShape::Query => prompts::QUERY_SYSTEM_PROMPT,
            OutputShape::Answer => prompts::ANSWER_SYSTEM_PROMPT,
        }
    }
}

#[async_trait]
impl<C: CompletionClient> StructuredGenerator for StructuredClient<C> {
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: OutputShape,
    ) -> Result<String, LLMError> {
        let request = CompletionRequest {
            messages: vec![
                Message {
                    role: Role::System,
                    content: Self::system_prompt(shape).to_string(),
                },
                Message {
                    role: Role::User,
                    content: prompt.to_string(),
                },
            ],
            max_tokens: Some(4096),
            temperature: self.temperature,
            json_mode: true,
        };
        let response = self.client.complete(request).await?;
        Ok(response.content)
    }
}
