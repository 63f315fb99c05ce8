use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, error};

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI API key not configured")] MissingApiKey,
    #[error("{0}")] Http(String),
    #[error("{status} {message}")] Status { status: StatusCode, message: String },
    #[error("Failed to parse completion: {0}")] Decode(String),
    #[error("Model returned no content")] EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { System, User }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One chat-completion call, independent of model and credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: u32,
    pub json_output: bool,
}

impl ChatRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage { role: Role::User, content: prompt.into() }],
            temperature: Some(0.7),
            max_tokens: 500,
            json_output: false,
        }
    }

    pub fn system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage { role: Role::System, content: prompt.into() }],
            ..Self::user(String::new())
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self { self.max_tokens = max_tokens; self }

    pub fn json(mut self) -> Self { self.json_output = true; self }

    pub fn without_temperature(mut self) -> Self { self.temperature = None; self }

    /// Text of the last message, used for log previews.
    pub fn prompt(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }
}

/// The upstream chat-completion service. Route handlers only see this trait.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Runs one completion and returns the first choice's message text (empty when the model sent none).
    async fn complete(&self, request: &ChatRequest) -> Result<String, OpenAiError>;

    /// Whether credentials are present at all.
    fn is_configured(&self) -> bool;
}

pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http(config, Client::new())
    }

    pub fn with_http(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, OpenAiError> {
        let api_key = self.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.base_url);

        info!("🔗 Chat completion ({} max tokens, json={}): {}", request.max_tokens, request.json_output, preview(request.prompt(), 120));

        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self.client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpenAiError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| OpenAiError::Http(e.to_string()))?;
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            error!("❌ API Error response: {}", preview(&response_text, 1000));
            return Err(OpenAiError::Status { status, message: upstream_message(&response_text) });
        }

        let parsed: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| OpenAiError::Decode(format!("{}: {}", e, preview(&response_text, 200))))?;

        // A choice with `content: null` reads as empty text; only a missing choice is an error.
        parsed.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or(OpenAiError::EmptyResponse)
    }

    fn is_configured(&self) -> bool { self.api_key.is_some() }
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw text.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| preview(body, 200))
}

/// Shortens long text for logging, on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...[{} chars]", &text[..cut], text.chars().count()),
        None => text.to_string(),
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice { message: ResponseMessage }

#[derive(Debug, Deserialize)]
struct ResponseMessage { #[serde(default)] content: Option<String> }

#[derive(Debug, Deserialize)]
struct ErrorEnvelope { error: ErrorDetail }

#[derive(Debug, Deserialize)]
struct ErrorDetail { message: String }
