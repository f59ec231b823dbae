//! Entity and relationship extraction.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ServiceResult;
use crate::graph::types::NounType;
use crate::llm::client::{ChatClient, ChatRequest};
use crate::llm::prompts;

/// A noun as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedNoun {
    pub text: String,
    #[serde(rename = "type", default = "other", deserialize_with = "lenient_noun_type")]
    pub noun_type: NounType,
    #[serde(default)]
    pub base_form: String,
}

/// A relationship as reported by the extractor. `source` and `target` name
/// nouns by surface text or base form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRelationship {
    pub source: String,
    pub action: String,
    pub target: String,
    #[serde(default)]
    pub base_action: String,
}

/// Extractor output. Missing keys deserialize to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub nouns: Vec<ExtractedNoun>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

impl Extraction {
    /// Parse a model reply. Code fences around the JSON are tolerated.
    pub fn parse(reply: &str) -> ServiceResult<Self> {
        let trimmed = strip_code_fence(reply.trim());
        Ok(serde_json::from_str(trimmed)?)
    }
}

fn other() -> NounType {
    NounType::Other
}

fn lenient_noun_type<'de, D>(deserializer: D) -> Result<NounType, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.map_or(NounType::Other, |l| NounType::from_label(&l)))
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Turns free text into nouns and relationships.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> ServiceResult<Extraction>;
}

/// [`Extractor`] backed by a JSON-mode chat completion.
pub struct LlmExtractor {
    client: Arc<ChatClient>,
    model: String,
}

impl LlmExtractor {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> ServiceResult<Extraction> {
        let prompt = prompts::extraction_prompt(text);
        let reply = self
            .client
            .complete(&ChatRequest {
                model: &self.model,
                prompt: &prompt,
                temperature: None,
                max_tokens: None,
                json_mode: true,
            })
            .await?;

        let extraction = Extraction::parse(&reply)?;
        tracing::debug!(
            nouns = extraction.nouns.len(),
            relationships = extraction.relationships.len(),
            "extraction parsed"
        );
        Ok(extraction)
    }
}
