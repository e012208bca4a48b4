//! Fixtures shared by the database-backed service tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use liftwise_core::llm::{
    CompletionClient, CompletionRequest, EmbeddingClient, LlmError,
};

/// Two weeks of three days; day 1 prescribes 3 + 2 sets.
pub fn program_json() -> Value {
    let day = |n: u32| {
        json!({
            "day": n,
            "exercises": [
                { "name": "Squat", "sets": 3, "reps": "5" },
                { "name": "Bench Press", "sets": 2, "reps": "8-10", "rir": 1 }
            ]
        })
    };
    let week = |n: u32| json!({ "week": n, "days": [day(1), day(2), day(3)] });
    json!({
        "title": "Full Body Basics",
        "summary": "Three full-body sessions per week.",
        "weeks": [week(1), week(2)]
    })
}

/// Completion client that replays a fixed reply and records requests.
pub struct CannedCompletion {
    reply: String,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl CannedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionClient for CannedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Embedding client returning a constant vector and counting calls.
pub struct FixedEmbedding {
    pub calls: Mutex<Vec<String>>,
}

impl FixedEmbedding {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EmbeddingClient for FixedEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.lock().unwrap().push(text.to_owned());
        Ok(vec![0.1, 0.2, 0.3])
    }
}
