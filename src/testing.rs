//! Test doubles shared by the unit tests.

use crate::openai::{ChatBackend, ChatRequest, OpenAiError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

type Reply = dyn Fn(&ChatRequest) -> Result<String, OpenAiError> + Send + Sync;

/// Answers every completion with a closure and records what it was asked.
pub struct ScriptedBackend {
    reply: Box<Reply>,
    seen: Mutex<Vec<ChatRequest>>,
    configured: bool,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new(reply: impl Fn(&ChatRequest) -> Result<String, OpenAiError> + Send + Sync + 'static) -> Self {
        Self { reply: Box::new(reply), seen: Mutex::new(Vec::new()), configured: true, delay: None }
    }

    /// Holds every answer back by `delay`, to keep a request in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unconfigured() -> Self {
        Self { configured: false, ..Self::new(|_| Err(OpenAiError::MissingApiKey)) }
    }

    pub fn requests(&self) -> Vec<ChatRequest> { self.seen.lock().clone() }

    pub fn prompts(&self) -> Vec<String> {
        self.seen.lock().iter().map(|r| r.prompt().to_string()).collect()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String, OpenAiError> {
        self.seen.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.reply)(request)
    }

    fn is_configured(&self) -> bool { self.configured }
}
