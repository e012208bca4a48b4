//! Seams to the external AI service.
//!
//! Generation and upload indexing depend only on these traits, so tests
//! can substitute canned clients and the server can swap providers.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::{OpenAiClient, OpenAiConfig};

/// Failure talking to the AI service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never produced an HTTP response.
    #[error("request to AI service failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("AI service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the body was not what we expected.
    #[error("unexpected response from AI service: {0}")]
    InvalidResponse(String),
}

/// A single system + user chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Produces the raw text of one chat completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Produces an embedding vector for a piece of text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}
