//! Drives a [`ViewState`] against a running server.

use chrono::Utc;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    models::{GenerationRequest, Platform},
    view::{ApiHealth, ViewError, ViewState},
};

const THINKING_INTERVAL: Duration = Duration::from_millis(2500);

#[derive(Clone)]
pub struct ContentClient {
    http: Client,
    base_url: String,
    view: Arc<Mutex<ViewState>>,
}

impl ContentClient {
    pub fn new(base_url: impl Into<String>) -> Self { Self::with_http(base_url, Client::new()) }

    pub fn with_http(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            view: Arc::default(),
        }
    }

    /// Copy of the current view.
    pub fn snapshot(&self) -> ViewState { self.view.lock().clone() }

    /// Runs `f` against the live view, e.g. to edit the form or navigate.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R { f(&mut self.view.lock()) }

    pub async fn check_api_status(&self) -> ApiHealth {
        let health = match self.http.get(format!("{}/api/check-api-status", self.base_url)).send().await {
            Ok(resp) if resp.status().is_success() => ApiHealth::Ok,
            Ok(resp) => {
                warn!("API status check returned {}", resp.status());
                ApiHealth::Error
            }
            Err(e) => {
                warn!("Error checking API status: {}", e);
                ApiHealth::Error
            }
        };
        self.view.lock().set_api_status(health);
        health
    }

    /// Full generation for the current form. Thinking steps advance while waiting.
    pub async fn submit(&self) -> Result<(), ViewError> {
        let (ticket, payload, endpoint) = {
            let mut view = self.view.lock();
            let (ticket, payload) = view.begin_submit(Utc::now())?;
            (ticket, payload, view.mode().endpoint())
        };

        let request = self.post(endpoint, &payload);
        tokio::pin!(request);
        let mut ticker = tokio::time::interval(THINKING_INTERVAL);
        ticker.tick().await;
        let outcome = loop {
            tokio::select! {
                outcome = &mut request => break outcome,
                _ = ticker.tick() => { self.view.lock().advance_thinking(); }
            }
        };

        let mut view = self.view.lock();
        let applied = match outcome {
            Ok(body) => view.complete_submit(ticket, &body, Utc::now()),
            Err(message) => view.fail_submit(ticket, message, Utc::now()),
        };
        if !applied {
            info!("Submit result dropped");
        }
        Ok(())
    }

    /// Re-runs generation for one platform and swaps in only that platform's content.
    pub async fn regenerate(&self, platform: Platform) {
        let started = {
            let mut view = self.view.lock();
            view.begin_regenerate(platform).map(|(ticket, payload)| (ticket, payload, view.mode().endpoint()))
        };
        let Some((ticket, payload, endpoint)) = started else { return };

        let outcome = self.post(endpoint, &payload).await;
        self.view.lock().complete_regenerate(ticket, outcome);
    }

    /// Stops reacting to the in-flight submit; the HTTP request is left to finish.
    pub fn stop(&self) { self.view.lock().stop(Utc::now()); }

    async fn post(&self, endpoint: &str, payload: &GenerationRequest) -> Result<Value, String> {
        let response = self.http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_message(status, &text));
        }
        response.json::<Value>().await.map_err(|_| ViewError::InvalidData.to_string())
    }
}

/// Message for a non-2xx response: the body's `error`, else the raw body, else the status.
fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = format!("HTTP error {}", status.as_u16());
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) if !body.is_empty() => body.chars().take(200).collect(),
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::GenerationMode,
        openai::OpenAiError,
        routes::{router, AppState},
        testing::ScriptedBackend,
        view::Screen,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn serve(backend: ScriptedBackend) -> ContentClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AppState { backend: Arc::new(backend), max_tokens: 512 });
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        ContentClient::with_http(format!("http://{addr}"), Client::builder().no_proxy().build().unwrap())
    }

    fn platform(brief: &str) -> Value {
        json!({ "brief": brief, "detailed": { "focus": brief, "ideas": [{ "title": format!("{brief} idea") }] } })
    }

    /// Generation replies carry a brief that says which prompt produced them.
    fn generator() -> ScriptedBackend {
        ScriptedBackend::new(|req| {
            let prompt = req.prompt();
            if !prompt.starts_with("You are a professional") {
                return Err(OpenAiError::EmptyResponse);
            }
            let tag = if prompt.contains("A specific platform is requested") { "regenerated" } else { "first" };
            let kind = if prompt.contains("AI trends analyst") { "trends" } else { "content" };
            Ok(json!({
                "brandAnalysis": { "name": "Nike", "domain": "nike.com", "personality": "Bold", "tone": "Direct", "focus": kind },
                "content": {
                    "instagram": platform(&format!("ig {tag}")),
                    "facebook": platform(&format!("fb {tag}")),
                    "youtube": platform(&format!("yt {tag}")),
                    "linkedin": platform(&format!("li {tag}"))
                }
            })
            .to_string())
        })
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, r#"{"error":"URL is required"}"#), "URL is required");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, r#"{"detail":"x"}"#), "HTTP error 502");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "HTTP error 502");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, &"x".repeat(300)).len(), 200);
    }

    #[tokio::test]
    async fn submit_then_browse_and_regenerate() {
        let client = serve(generator()).await;
        client.with_view(|v| v.form.url = Some("nike.com".into()));

        client.submit().await.unwrap();
        let view = client.snapshot();
        assert_eq!(view.error(), None);
        assert_eq!(view.screen(), Screen::PlatformList);
        assert_eq!(view.brand_analysis().unwrap().focus, "content");

        client.with_view(|v| v.show_details(Platform::YouTube));
        assert_eq!(client.snapshot().screen(), Screen::PlatformDetail(Platform::YouTube));

        client.regenerate(Platform::YouTube).await;
        let view = client.snapshot();
        let results = view.results().unwrap();
        assert_eq!(results.youtube.brief, "yt regenerated");
        assert_eq!(results.instagram.brief, "ig first");
        assert_eq!(results.linkedin.brief, "li first");
        assert_eq!(view.detail().unwrap().content.focus, "yt regenerated");

        client.with_view(|v| v.close_details());
        assert_eq!(client.snapshot().screen(), Screen::PlatformList);
    }

    #[tokio::test]
    async fn trends_mode_uses_trend_endpoint() {
        let client = serve(generator()).await;
        client.with_view(|v| {
            v.form.url = Some("https://nike.com".into());
            v.toggle_mode();
        });
        assert_eq!(client.snapshot().mode(), GenerationMode::AiTrends);

        client.submit().await.unwrap();
        assert_eq!(client.snapshot().brand_analysis().unwrap().focus, "trends");
    }

    #[tokio::test]
    async fn upstream_failure_reaches_error_banner() {
        let client = serve(ScriptedBackend::new(|_| Err(OpenAiError::Http("connection refused".into())))).await;
        client.with_view(|v| v.form.url = Some("nike.com".into()));

        client.submit().await.unwrap();
        let view = client.snapshot();
        assert_eq!(view.error(), Some("connection refused"));
        assert!(view.results().is_none());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn stop_during_submit_drops_the_late_result() {
        let client = serve(generator().with_delay(Duration::from_millis(300))).await;
        client.with_view(|v| v.form.url = Some("nike.com".into()));

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(client.snapshot().is_loading());
            client.stop();
        };
        let (submitted, ()) = tokio::join!(client.submit(), stopper);
        submitted.unwrap();

        let view = client.snapshot();
        assert!(view.is_stopped());
        assert!(!view.is_loading());
        assert!(view.results().is_none());
        assert_eq!(view.error(), None);
        assert_eq!(view.screen(), Screen::Form);

        // the next submit is not affected by the earlier stop
        client.submit().await.unwrap();
        let view = client.snapshot();
        assert!(!view.is_stopped());
        assert_eq!(view.results().unwrap().instagram.brief, "ig first");
    }

    #[tokio::test]
    async fn invalid_url_never_hits_the_network() {
        let client = ContentClient::new("http://127.0.0.1:9");
        client.with_view(|v| v.form.url = Some("bad url".into()));
        assert_eq!(client.submit().await.unwrap_err(), ViewError::InvalidUrl);
    }

    #[tokio::test]
    async fn api_status_is_recorded() {
        let client = serve(ScriptedBackend::unconfigured()).await;
        assert_eq!(client.check_api_status().await, ApiHealth::Error);
        assert_eq!(client.snapshot().api_status(), ApiHealth::Error);

        let client = serve(ScriptedBackend::new(|_| Ok("pong".into()))).await;
        assert_eq!(client.check_api_status().await, ApiHealth::Ok);
    }
}
