//! Turns a completion into a validated [`Program`].
//!
//! Either a fully valid program comes back or an error does; nothing is
//! persisted here.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::prompt::{Questionnaire, build_prompt};
use super::schema::{Program, SchemaError, validate_program};
use crate::llm::{CompletionClient, CompletionRequest, LlmError};
use crate::text::truncate_chars;

pub const GENERATION_TEMPERATURE: f32 = 0.4;

/// Length of the raw-response excerpt carried by [`GenerationError::NotJson`].
pub const RAW_SNIPPET_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error("AI response was not valid JSON ({source}); response began: {snippet:?}")]
    NotJson {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parse and validate raw completion text.
///
/// A surrounding markdown code fence is tolerated.
pub fn assemble_program(raw: &str) -> Result<Program, GenerationError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(|source| GenerationError::NotJson {
        snippet: truncate_chars(raw, RAW_SNIPPET_CHARS).to_owned(),
        source,
    })?;
    Ok(validate_program(&value)?)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Generates programs through a completion client.
pub struct ProgramAssembler<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: CompletionClient + ?Sized> ProgramAssembler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Build the prompt, request a completion, and assemble the result.
    pub async fn generate(
        &self,
        questionnaire: &Questionnaire,
        upload: Option<&str>,
    ) -> Result<Program, GenerationError> {
        let prompt = build_prompt(questionnaire, upload);
        let request = CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            temperature: GENERATION_TEMPERATURE,
        };

        let raw = self.client.complete(&request).await?;
        match assemble_program(&raw) {
            Ok(program) => {
                info!(
                    title = %program.title,
                    weeks = program.weeks.len(),
                    days = program.total_days(),
                    "generated program"
                );
                Ok(program)
            }
            Err(e) => {
                warn!(error = %e, "rejected generated program");
                Err(e)
            }
        }
    }
}
