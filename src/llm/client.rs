use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{ServiceError, ServiceResult};

/// A single chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object reply.
    pub json_mode: bool,
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct ChatClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> ServiceResult<Self> {
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: http_client(Duration::from_secs(config.timeout_secs))?,
        })
    }

    /// Send a single-message chat completion and return the reply text.
    pub async fn complete(&self, request: &ChatRequest<'_>) -> ServiceResult<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = request_body(request);

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: "chat API",
                status,
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        tracing::debug!(model = request.model, "chat completion received");
        reply_text(&json).ok_or(ServiceError::EmptyResponse("chat API"))
    }
}

/// HTTP client shared by the model services; every request is bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> ServiceResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn request_body(request: &ChatRequest<'_>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": request.model,
        "messages": [
            { "role": "user", "content": request.prompt },
        ],
    });
    if let Some(t) = request.temperature {
        body["temperature"] = serde_json::json!(t);
    }
    if let Some(n) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(n);
    }
    if request.json_mode {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

fn reply_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}
