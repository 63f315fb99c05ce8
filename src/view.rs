//! State of the browsing page, independent of any rendering.
//!
//! Async results are tied to the action that started them through a
//! [`Ticket`]; results for stale or stopped actions are dropped.

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    BrandAnalysis, ContentItem, DetailedContent, GenerationMode, GenerationRequest, GenerationResponse, Idea, Platform,
    PlatformContent,
};

pub const THINKING_STEPS: [&str; 5] = [
    "Analyzing website structure and content...",
    "Identifying brand voice, tone, and key offerings...",
    "Crafting platform-specific content strategies...",
    "Generating tailored content ideas for each platform...",
    "Finalizing content and preparing results...",
];

pub const TREND_THINKING_STEPS: [&str; 5] = [
    "Analyzing website structure and content...",
    "Identifying industry and company focus...",
    "Researching relevant AI trends in this industry...",
    "Connecting company offerings with industry AI trends...",
    "Creating platform-specific AI trend content...",
];

const API_HINTS: [&str; 3] = [
    "Checking if the URL is valid and accessible",
    "Trying again in a few minutes",
    "Using a different URL",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("URL is required")] MissingUrl,
    #[error("Please enter a valid URL (e.g., nike.com)")] InvalidUrl,
    #[error("Invalid response structure")] InvalidStructure,
    #[error("Missing platform data: {0}")] MissingPlatform(&'static str),
    #[error("Failed to parse the response. The API returned invalid data.")] InvalidData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiHealth {
    #[default]
    Unknown,
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Ideas,
    Stats,
}

/// What the results area shows. Exactly one variant at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    PlatformList,
    PlatformDetail(Platform),
    IdeaDetail { platform: Platform, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub platform: Platform,
    pub content: DetailedContent,
    pub regenerating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind { Image, Text, Link, Video, Notes, List, Data }

#[derive(Debug, Clone, PartialEq)]
pub struct IdeaField {
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Form inputs. `url` is kept as typed; it is normalized on submit.
    pub form: GenerationRequest,
    mode: GenerationMode,
    api_status: ApiHealth,
    loading: bool,
    stopped: bool,
    error: Option<String>,
    results: Option<PlatformContent>,
    brand_analysis: Option<BrandAnalysis>,
    search_complete: bool,
    detail: Option<DetailView>,
    selected_idea: Option<usize>,
    active_tab: Tab,
    expanded_designs: BTreeSet<usize>,
    copied: Option<String>,
    loading_platform: Option<Platform>,
    thinking_step: usize,
    started_at: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
    next_ticket: u64,
    submit_ticket: Option<Ticket>,
    regenerate_ticket: Option<(Ticket, Platform)>,
}

impl ViewState {
    pub fn new() -> Self { Self::default() }

    pub fn mode(&self) -> GenerationMode { self.mode }
    pub fn api_status(&self) -> ApiHealth { self.api_status }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn is_stopped(&self) -> bool { self.stopped }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn results(&self) -> Option<&PlatformContent> { self.results.as_ref() }
    pub fn brand_analysis(&self) -> Option<&BrandAnalysis> { self.brand_analysis.as_ref() }
    pub fn search_complete(&self) -> bool { self.search_complete }
    pub fn detail(&self) -> Option<&DetailView> { self.detail.as_ref() }
    pub fn active_tab(&self) -> Tab { self.active_tab }
    pub fn loading_platform(&self) -> Option<Platform> { self.loading_platform }
    pub fn copied(&self) -> Option<&str> { self.copied.as_deref() }
    pub fn is_design_expanded(&self, index: usize) -> bool { self.expanded_designs.contains(&index) }

    pub fn set_api_status(&mut self, status: ApiHealth) { self.api_status = status; }

    pub fn screen(&self) -> Screen {
        match (&self.results, &self.detail, self.selected_idea) {
            (None, _, _) => Screen::Form,
            (Some(_), None, _) => Screen::PlatformList,
            (Some(_), Some(d), None) => Screen::PlatformDetail(d.platform),
            (Some(_), Some(d), Some(index)) => Screen::IdeaDetail { platform: d.platform, index },
        }
    }

    pub fn selected_idea(&self) -> Option<&Idea> {
        let index = self.selected_idea?;
        self.detail.as_ref()?.content.ideas.get(index)
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Starts a full generation. Returns the payload to post to [`GenerationMode::endpoint`].
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<(Ticket, GenerationRequest), ViewError> {
        let raw = self.form.url().ok_or(ViewError::MissingUrl)?.to_string();

        self.loading = true;
        self.results = None;
        self.error = None;
        self.brand_analysis = None;
        self.detail = None;
        self.selected_idea = None;
        self.expanded_designs.clear();
        self.thinking_step = 0;
        self.elapsed = None;
        self.started_at = Some(now);
        self.stopped = false;
        self.search_complete = false;

        let url = format_url(&raw);
        if Url::parse(&url).is_err() {
            self.loading = false;
            self.started_at = None;
            self.error = Some(ViewError::InvalidUrl.to_string());
            return Err(ViewError::InvalidUrl);
        }

        let ticket = self.issue_ticket();
        self.submit_ticket = Some(ticket);
        info!("Submitting request to: {}", self.mode.endpoint());
        Ok((ticket, GenerationRequest { url: Some(url), platform: None, ..self.form.clone() }))
    }

    /// Applies a 2xx body. Returns whether it was applied.
    pub fn complete_submit(&mut self, ticket: Ticket, body: &Value, now: DateTime<Utc>) -> bool {
        if !self.finish_submit(ticket, now) {
            return false;
        }
        match validate_response(body) {
            Ok(response) => {
                self.results = Some(response.content);
                self.brand_analysis = Some(response.brand_analysis);
                self.search_complete = true;
            }
            Err(e) => {
                warn!("Error parsing API response: {}", e);
                self.error = Some(ViewError::InvalidData.to_string());
            }
        }
        true
    }

    /// Records a failed submit. Returns whether it was applied.
    pub fn fail_submit(&mut self, ticket: Ticket, message: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.finish_submit(ticket, now) {
            return false;
        }
        let message = message.into();
        warn!("Error generating {}: {}", if self.mode == GenerationMode::AiTrends { "AI trends" } else { "content" }, message);
        self.error = Some(message);
        true
    }

    fn finish_submit(&mut self, ticket: Ticket, now: DateTime<Utc>) -> bool {
        if self.stopped || self.submit_ticket != Some(ticket) {
            info!("Ignoring result for stopped or superseded request");
            return false;
        }
        self.submit_ticket = None;
        self.loading = false;
        self.thinking_step = 0;
        self.record_elapsed(now);
        true
    }

    /// Stops reacting to the in-flight submit. The request itself keeps running.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if !self.loading {
            return;
        }
        self.loading = false;
        self.stopped = true;
        self.thinking_step = 0;
        self.record_elapsed(now);
    }

    fn record_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.started_at {
            self.elapsed = Some(now - start);
        }
    }

    /// Whole seconds spent on the current or last submit.
    pub fn processing_seconds(&self, now: DateTime<Utc>) -> i64 {
        match (self.elapsed, self.started_at) {
            (Some(elapsed), _) => elapsed.num_seconds(),
            (None, Some(start)) if self.loading => (now - start).num_seconds(),
            _ => 0,
        }
    }

    /// Summary line shown once a submit has finished or been stopped.
    pub fn processing_summary(&self) -> Option<String> {
        let secs = self.elapsed?.num_seconds();
        Some(if self.stopped {
            format!("Processing stopped after {secs}s")
        } else {
            format!("Processed in {secs}s")
        })
    }

    fn thinking_steps(&self) -> &'static [&'static str] {
        match self.mode {
            GenerationMode::Content => &THINKING_STEPS,
            GenerationMode::AiTrends => &TREND_THINKING_STEPS,
        }
    }

    pub fn advance_thinking(&mut self) {
        if self.loading {
            self.thinking_step = (self.thinking_step + 1).min(self.thinking_steps().len() - 1);
        }
    }

    pub fn thinking_message(&self) -> Option<&'static str> {
        self.loading.then(|| self.thinking_steps()[self.thinking_step])
    }

    pub fn show_details(&mut self, platform: Platform) {
        let Some(results) = &self.results else { return };
        self.detail = Some(DetailView { platform, content: results.get(platform).detailed.clone(), regenerating: false });
        self.selected_idea = None;
        self.active_tab = Tab::Ideas;
    }

    pub fn close_details(&mut self) {
        self.detail = None;
        self.selected_idea = None;
    }

    /// Opens one idea of the platform in view. Out-of-range indices are ignored.
    pub fn select_idea(&mut self, index: usize) -> bool {
        let in_range = self.detail.as_ref().is_some_and(|d| index < d.content.ideas.len());
        if in_range {
            self.selected_idea = Some(index);
        }
        in_range
    }

    pub fn back_from_idea(&mut self) { self.selected_idea = None; }

    pub fn set_tab(&mut self, tab: Tab) { self.active_tab = tab; }

    pub fn toggle_design_details(&mut self, index: usize) {
        if !self.expanded_designs.remove(&index) {
            self.expanded_designs.insert(index);
        }
    }

    pub fn mark_copied(&mut self, key: impl Into<String>) { self.copied = Some(key.into()); }

    pub fn clear_copied(&mut self) { self.copied = None; }

    /// Flips between content and AI-trend generation, dropping results from the other mode.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        if self.search_complete {
            self.results = None;
            self.brand_analysis = None;
            self.detail = None;
            self.selected_idea = None;
            self.search_complete = false;
        }
    }

    /// Starts regenerating one platform. `None` when there is no URL to regenerate for.
    pub fn begin_regenerate(&mut self, platform: Platform) -> Option<(Ticket, GenerationRequest)> {
        let url = format_url(self.form.url()?);
        self.loading_platform = Some(platform);
        if let Some(detail) = self.detail.as_mut().filter(|d| d.platform == platform) {
            detail.regenerating = true;
            self.selected_idea = None;
        }
        let ticket = self.issue_ticket();
        self.regenerate_ticket = Some((ticket, platform));
        Some((ticket, GenerationRequest { url: Some(url), platform: Some(platform.key().to_string()), ..self.form.clone() }))
    }

    /// Replaces one platform's slice from a regenerate response. Other platforms are untouched.
    pub fn complete_regenerate(&mut self, ticket: Ticket, outcome: Result<Value, String>) -> bool {
        let Some((pending, platform)) = self.regenerate_ticket else { return false };
        if pending != ticket {
            return false;
        }
        self.regenerate_ticket = None;
        self.loading_platform = None;

        let item = outcome.and_then(|body| {
            let slice = body.get("content").and_then(|c| c.get(platform.key())).cloned().ok_or_else(|| format!("Missing platform data: {}", platform.key()))?;
            serde_json::from_value::<ContentItem>(slice).map_err(|e| e.to_string())
        });

        match item {
            Ok(item) => {
                if let Some(results) = self.results.as_mut() {
                    if let Some(detail) = self.detail.as_mut().filter(|d| d.platform == platform) {
                        detail.content = item.detailed.clone();
                        detail.regenerating = false;
                    }
                    *results.get_mut(platform) = item;
                }
            }
            Err(e) => {
                warn!("Error regenerating content: {}", e);
                if let Some(detail) = self.detail.as_mut() {
                    detail.regenerating = false;
                }
            }
        }
        true
    }

    /// Troubleshooting hints shown under an error that mentions the API.
    pub fn error_hints(&self) -> &'static [&'static str] {
        match &self.error {
            Some(e) if e.contains("API") => &API_HINTS,
            _ => &[],
        }
    }
}

/// Trims and adds `https://` when no scheme is given.
pub fn format_url(input: &str) -> String {
    let url = input.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// The one shape check applied to generation results: both top-level keys and all four platforms.
pub fn validate_response(body: &Value) -> Result<GenerationResponse, ViewError> {
    if !is_truthy(body.get("brandAnalysis")) || !is_truthy(body.get("content")) {
        return Err(ViewError::InvalidStructure);
    }
    for platform in Platform::ALL {
        if !is_truthy(body["content"].get(platform.key())) {
            return Err(ViewError::MissingPlatform(platform.key()));
        }
    }
    serde_json::from_value(body.clone()).map_err(|_| ViewError::InvalidStructure)
}

/// Labelled fields of an idea, in the order each platform presents them.
pub fn platform_fields(platform: Option<Platform>, idea: &Idea) -> Vec<IdeaField> {
    let Some(platform) = platform else { return generic_fields(idea) };
    let mut fields = Vec::new();
    let mut push = |label: &str, value: &Option<String>, kind: FieldKind| {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            fields.push(IdeaField { label: label.to_string(), value: value.to_string(), kind });
        }
    };
    match platform {
        Platform::Instagram => {
            push("Visual Concept", &idea.visual, FieldKind::Image);
            push("Caption", &idea.caption, FieldKind::Text);
        }
        Platform::Facebook => {
            push("Post Content", &idea.content, FieldKind::Text);
            push("Call to Action", &idea.call_to_action, FieldKind::Link);
        }
        Platform::YouTube => {
            push("Video Format", &idea.format, FieldKind::Video);
            push("Production Notes", &idea.production_notes, FieldKind::Notes);
            push("Video Outline", &idea.outline, FieldKind::List);
        }
        Platform::LinkedIn => {
            push("Post Content", &idea.content, FieldKind::Text);
            push("Trend Analysis", &idea.trend_analysis, FieldKind::Data);
            push("Conclusion", &idea.conclusion, FieldKind::Link);
            push("Key Data Points", &idea.data_points, FieldKind::Data);
            push("Call to Action", &idea.call_to_action, FieldKind::Link);
        }
    }
    fields
}

/// Every top-level string field except the title, for platforms without a layout.
fn generic_fields(idea: &Idea) -> Vec<IdeaField> {
    let Ok(Value::Object(map)) = serde_json::to_value(idea) else { return Vec::new() };
    map.into_iter()
        .filter(|(key, _)| key != "title" && !key.contains("Details"))
        .filter_map(|(key, value)| {
            let Value::String(value) = value else { return None };
            let mut label = key;
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            Some(IdeaField { label, value, kind: FieldKind::Text })
        })
        .collect()
}

/// Clipboard text for a set of fields.
pub fn copy_text(fields: &[IdeaField]) -> String {
    fields.iter().map(|f| format!("{}: {}", f.label, f.value)).collect::<Vec<_>>().join("\n\n")
}
