//! Natural-language answer synthesis over retrieved context.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::LlmConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::graph::types::JoinedRelationship;
use crate::llm::client::{ChatClient, ChatRequest};
use crate::llm::prompts;

/// Reply used when the model returns no content.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer.";

/// A transcript selected for a query, with its similarity score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTranscript {
    pub id: String,
    pub overview: String,
    pub similarity: f32,
    pub received_at: String,
}

/// Everything the answer generator may ground its reply in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerContext {
    pub transcripts: Vec<ScoredTranscript>,
    pub relationships: Vec<JoinedRelationship>,
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, query: &str, context: &AnswerContext) -> ServiceResult<String>;
}

/// [`AnswerGenerator`] backed by a chat completion.
pub struct LlmAnswerGenerator {
    client: Arc<ChatClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmAnswerGenerator {
    pub fn new(client: Arc<ChatClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.answer_model.clone(),
            temperature: config.answer_temperature,
            max_tokens: config.answer_max_tokens,
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, query: &str, context: &AnswerContext) -> ServiceResult<String> {
        let prompt = prompts::answer_prompt(query, context);
        let reply = self
            .client
            .complete(&ChatRequest {
                model: &self.model,
                prompt: &prompt,
                temperature: Some(self.temperature),
                max_tokens: Some(self.max_tokens),
                json_mode: false,
            })
            .await;

        match reply {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) | Err(ServiceError::EmptyResponse(_)) => Ok(FALLBACK_ANSWER.to_string()),
            Err(e) => Err(e),
        }
    }
}
