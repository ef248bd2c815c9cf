//! Hosted LLM client: a thin chat-completions wrapper with a fixed retry
//! budget.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mistral chat-completions endpoint.
pub const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Model used for code analysis.
pub const MISTRAL_MODEL: &str = "mistral-small-latest";

/// Sampling temperature; low, since review output should be stable.
pub const TEMPERATURE: f32 = 0.2;

/// Retries after the initial attempt, for transport errors and 429/5xx.
pub const MAX_RETRIES: u32 = 2;

/// A hosted model that turns a prompt into a generated response.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One failed attempt; `retryable` decides whether the budget may be spent.
struct AttemptError {
    retryable: bool,
    error: anyhow::Error,
}

impl AttemptError {
    fn retryable(error: anyhow::Error) -> Self {
        Self {
            retryable: true,
            error,
        }
    }

    fn fatal(error: anyhow::Error) -> Self {
        Self {
            retryable: false,
            error,
        }
    }
}

/// Chat client for the Mistral API.
#[derive(Debug, Clone)]
pub struct MistralClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl MistralClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: MISTRAL_API_URL.to_string(),
            api_key: api_key.into(),
            model: MISTRAL_MODEL.to_string(),
            temperature: TEMPERATURE,
            max_retries: MAX_RETRIES,
        }
    }

    /// Point the client at a different endpoint (builder style)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn try_complete(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::retryable(anyhow!(e).context("sending chat request")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AttemptError::retryable(anyhow!(
                "chat endpoint returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::fatal(anyhow!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::fatal(anyhow!(e).context("decoding chat response")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AttemptError::fatal(anyhow!("chat response contained no choices")))
    }
}

#[async_trait]
impl ChatModel for MistralClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.try_complete(prompt).await {
                Ok(answer) => return Ok(answer),
                Err(e) if e.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(500 * (1 << attempt));
                    tracing::warn!(
                        "Chat attempt {attempt}/{} failed ({:#}), retrying in {delay:?}",
                        self.max_retries,
                        e.error
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.error),
            }
        }
    }
}
