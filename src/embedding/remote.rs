//! HTTP embedding provider for OpenAI-compatible and Ollama APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ensure_not_blank, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::llm::client::http_client;
use crate::error::{ServiceError, ServiceResult};

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
const OLLAMA_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Flavor {
    OpenAi { api_key: Option<String> },
    Ollama,
}

pub struct RemoteEmbeddingProvider {
    flavor: Flavor,
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl RemoteEmbeddingProvider {
    pub fn from_config(
        config: &EmbeddingConfig,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> ServiceResult<Self> {
        let (flavor, default_endpoint) = match config.provider.as_str() {
            "openai" => (
                Flavor::OpenAi {
                    api_key: api_key.map(str::to_string),
                },
                OPENAI_ENDPOINT,
            ),
            "ollama" => (Flavor::Ollama, OLLAMA_ENDPOINT),
            other => {
                return Err(ServiceError::Config(format!(
                    "unknown embedding provider: {other}. Supported: openai, ollama"
                )))
            }
        };

        let endpoint = if config.endpoint.is_empty() {
            default_endpoint.to_string()
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };

        Ok(Self {
            flavor,
            endpoint,
            model: config.model.clone(),
            client: http_client(timeout)?,
        })
    }

    async fn embed_openai(&self, text: &str, api_key: Option<&str>) -> ServiceResult<Vec<f32>> {
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let mut req = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
                "encoding_format": "float",
            }));
        if let Some(key) = api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: "embedding API",
                status,
                body,
            });
        }

        let result: EmbeddingResponse = response.json().await?;
        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(ServiceError::EmptyResponse("embedding API"))
    }

    async fn embed_ollama(&self, text: &str) -> ServiceResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.endpoint))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: "Ollama",
                status,
                body,
            });
        }

        let result: serde_json::Value = response.json().await?;
        let embedding: Vec<f32> = result
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or(ServiceError::EmptyResponse("Ollama"))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> ServiceResult<Vec<f32>> {
        ensure_not_blank(text)?;
        let embedding = match &self.flavor {
            Flavor::OpenAi { api_key } => self.embed_openai(text, api_key.as_deref()).await?,
            Flavor::Ollama => self.embed_ollama(text).await?,
        };
        tracing::debug!(model = %self.model, dims = embedding.len(), "text embedded");
        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
