use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ExtractionOracle, OracleError};

const JSON_ONLY_REMINDER: &str = "IMPORTANT: You MUST respond with ONLY valid JSON. \
     No explanations, no markdown, no code blocks. Just the raw JSON object.";

/// Local oracle served by an Ollama instance.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Misconfigured(format!("ollama http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ExtractionOracle for OllamaClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        let user_content = format!("{JSON_ONLY_REMINDER}\n\n{user_prompt}");
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: system_prompt,
                },
                OllamaMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                OracleError::Transport(format!(
                    "ollama unreachable at {}: {e}",
                    self.base_url
                ))
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport(format!("HTTP {status}: {body}")));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(format!("ollama: {e}")))?;

        let content = parsed
            .message
            .map(|m| strip_code_fence(&m.content).to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(OracleError::EmptyResponse("ollama".to_string()));
        }

        tracing::debug!(response_len = content.len(), "Ollama answered");
        Ok(content)
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
