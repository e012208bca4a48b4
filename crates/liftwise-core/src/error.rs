//! Error type for the service layer.
//!
//! Each variant corresponds to one way a request can fail, so the HTTP
//! layer can pick a status code without inspecting messages.

use thiserror::Error;

use crate::llm::LlmError;
use crate::program::{GenerationError, ProgramJsonError, SchemaError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A routine, week, or day that does not exist for this user.
    #[error("{0} not found")]
    NotFound(String),

    /// A hand-edited program that failed to parse or validate.
    #[error(transparent)]
    InvalidProgram(#[from] ProgramJsonError),

    /// A stored program that no longer validates.
    #[error("stored program is invalid: {0}")]
    CorruptProgram(SchemaError),

    /// Program generation failed (AI service or its output).
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Request input that fails a business rule.
    #[error("{0}")]
    InvalidInput(String),

    /// The request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    #[error("embedding failed: {0}")]
    Embedding(LlmError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
