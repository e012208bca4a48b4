//! Client for OpenAI-compatible `chat/completions` and `embeddings`
//! endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{CompletionClient, CompletionRequest, EmbeddingClient, LlmError};
use crate::text::truncate_chars;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4.1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Embedding requests are cut to this many characters.
pub const EMBEDDING_INPUT_CHARS: usize = 6000;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequestBody<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponseBody {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection settings for an OpenAI-compatible service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub generation_model: String,
    pub embedding_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            generation_model: DEFAULT_GENERATION_MODEL.to_owned(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
        }
    }
}

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Build a client with fixed connect and request timeouts.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    async fn post_json<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<String, LlmError> {
        let mut request = self.client.post(self.api_url(endpoint)).json(body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(endpoint, error = %e, "AI service request failed");
            LlmError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(parse_error_response(status.as_u16(), &text));
        }
        Ok(text)
    }
}

fn parse_error_response(status: u16, body: &str) -> LlmError {
    let message = match serde_json::from_str::<ErrorResponseBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => truncate_chars(body, 200).to_owned(),
    };
    LlmError::Api { status, message }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %self.config.generation_model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequestBody {
            model: &self.config.generation_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let text = self.post_json("chat/completions", &body).await?;
        let parsed: ChatResponseBody = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("malformed completion body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("completion had no content".into()))?;

        debug!(chars = content.len(), "received completion");
        Ok(content)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    #[instrument(skip(self, text), fields(model = %self.config.embedding_model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let body = EmbeddingRequestBody {
            model: &self.config.embedding_model,
            input: truncate_chars(text, EMBEDDING_INPUT_CHARS),
        };

        let text = self.post_json("embeddings", &body).await?;
        let parsed: EmbeddingResponseBody = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("malformed embedding body: {e}")))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::InvalidResponse("embedding response had no data".into()))?;

        debug!(dims = embedding.len(), "received embedding");
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.generation_model, "gpt-4.1");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = OpenAiClient::new(OpenAiConfig {
            base_url: "http://localhost:9000/v1/".into(),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.api_url("chat/completions"),
            "http://localhost:9000/v1/chat/completions"
        );
    }

    #[test]
    fn error_body_with_message_is_parsed() {
        let err = parse_error_response(401, r#"{"error":{"message":"bad key","type":"auth"}}"#);
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_is_kept_raw() {
        let err = parse_error_response(502, "Bad Gateway");
        assert!(matches!(err, LlmError::Api { status: 502, ref message } if message == "Bad Gateway"));
    }
}
