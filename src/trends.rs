use crate::{models::GenerationMode, openai::{preview, ChatBackend, ChatRequest, OpenAiError}};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const MAX_TERMS: usize = 4;

#[derive(Debug, Error)]
enum ProbeError {
    #[error(transparent)] Upstream(#[from] OpenAiError),
    #[error("search terms not usable: {0}")] Terms(String),
}

/// Best-effort research step run before the main generation call.
///
/// Asks the model for a handful of search terms, then one short summary per
/// term. Any failure collapses into [`TrendProber::fallback`].
pub struct TrendProber<'a> {
    backend: &'a dyn ChatBackend,
    mode: GenerationMode,
}

impl<'a> TrendProber<'a> {
    pub fn new(backend: &'a dyn ChatBackend, mode: GenerationMode) -> Self { Self { backend, mode } }

    pub async fn probe(&self, url: &str, platform: Option<&str>) -> String {
        match self.research(url, platform).await {
            Ok(context) => {
                info!("🔎 Trend research gathered ({} chars)", context.len());
                context
            }
            Err(e) => {
                warn!("⚠️ Trend research failed, continuing without it: {}", e);
                self.fallback().to_string()
            }
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self.mode {
            GenerationMode::Content => "Note: Unable to search for current trends. Use your existing knowledge to suggest trending content.",
            GenerationMode::AiTrends => "Note: Unable to search for current AI trends. Use your existing knowledge to suggest cutting-edge AI content.",
        }
    }

    async fn research(&self, url: &str, platform: Option<&str>) -> Result<String, ProbeError> {
        let terms_text = self.backend.complete(&ChatRequest::user(self.terms_prompt(url, platform)).json()).await?;
        let terms = parse_search_terms(&terms_text)?;
        info!("🔎 Search terms: {:?}", terms);

        let mut results = Vec::with_capacity(terms.len() + 1);
        for term in &terms {
            match self.mode {
                GenerationMode::Content => {
                    if mentions_music(term) {
                        let songs = self.ask(
                            "What are the current top 5 trending songs on Instagram and TikTok? Just list the songs and artists, no explanations.",
                            500,
                        ).await?;
                        results.push(format!("Current trending music for Instagram/TikTok: {songs}"));
                    }
                    let summary = self.ask(
                        &format!("What are the latest trends in \"{term}\" for content creation? Provide a brief summary."),
                        500,
                    ).await?;
                    results.push(format!("Latest trends for \"{term}\": {summary}"));
                }
                GenerationMode::AiTrends => {
                    let summary = self.ask(
                        &format!("What are the latest trends and innovations in \"{term}\"? Provide a detailed summary focusing on the most cutting-edge developments."),
                        800,
                    ).await?;
                    results.push(format!("Latest AI trends for \"{term}\": {summary}"));
                }
            }
        }

        Ok(match self.mode {
            GenerationMode::Content => format!(
                "CURRENT TRENDS RESEARCH:\n{}\n\nUse the above trends research to inform your content creation and ensure it's current and relevant. Incorporate trending music, formats, and themes where appropriate.",
                results.join("\n\n")
            ),
            GenerationMode::AiTrends => {
                let general = self.ask(
                    "What are the latest ways AI is being used to create or enhance content for social media platforms like Instagram, Facebook, YouTube, and LinkedIn?",
                    800,
                ).await?;
                results.push(format!("AI in social media content creation: {general}"));
                format!(
                    "CURRENT AI TRENDS RESEARCH:\n{}\n\nUse the above AI trends research to inform your content creation and ensure it discusses the most current and relevant AI technologies and applications. Make specific references to these trends in your content ideas.",
                    results.join("\n\n")
                )
            }
        })
    }

    async fn ask(&self, prompt: &str, max_tokens: u32) -> Result<String, OpenAiError> {
        let answer = self.backend.complete(&ChatRequest::user(prompt).max_tokens(max_tokens)).await?;
        info!("🧾 Trend answer: {}", preview(&answer, 160));
        Ok(answer)
    }

    fn terms_prompt(&self, url: &str, platform: Option<&str>) -> String {
        let platforms = platform.unwrap_or("Instagram, Facebook, YouTube, and LinkedIn");
        match self.mode {
            GenerationMode::Content => format!(
                "Based on the website {url}, what are the top 3 specific trends I should search for to create content for {platforms}? \
                Format your response as a JSON object of the form {{\"searchTerms\": [\"term\", ...]}} with just the search terms, no explanations."
            ),
            GenerationMode::AiTrends => format!(
                "Based on the website {url}, what are the top 3 specific AI trends relevant to this industry that I should search for to create content? \
                Format your response as a JSON object of the form {{\"searchTerms\": [\"term\", ...]}} with just the search terms, no explanations."
            ),
        }
    }
}

/// Accepts `["a", "b"]`, `{"searchTerms": [...]}` or any object holding one array of strings.
fn parse_search_terms(text: &str) -> Result<Vec<String>, ProbeError> {
    let value: Value = serde_json::from_str(text.trim()).map_err(|e| ProbeError::Terms(e.to_string()))?;
    let list = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("searchTerms")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(Value::as_array))
            .ok_or_else(|| ProbeError::Terms("no array in response".into()))?,
        other => return Err(ProbeError::Terms(format!("unexpected JSON: {other}"))),
    };
    let terms: Vec<String> = list
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .take(MAX_TERMS)
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        return Err(ProbeError::Terms("empty term list".into()));
    }
    Ok(terms)
}

fn mentions_music(term: &str) -> bool {
    let term = term.to_lowercase();
    ["music", "instagram", "tiktok"].iter().any(|k| term.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_every_accepted_term_shape() {
        assert_eq!(parse_search_terms(r#"["reels", " ugc "]"#).unwrap(), vec!["reels", "ugc"]);
        assert_eq!(parse_search_terms(r#"{"searchTerms": ["a", "b", "c"]}"#).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(parse_search_terms(r#"{"trends": ["x"]}"#).unwrap(), vec!["x"]);
        assert_eq!(parse_search_terms(r#"["1","2","3","4","5","6"]"#).unwrap().len(), MAX_TERMS);
        assert!(parse_search_terms("not json").is_err());
        assert!(parse_search_terms(r#"{"searchTerms": []}"#).is_err());
        assert!(parse_search_terms(r#""just a string""#).is_err());
    }

    #[test]
    fn music_detection_is_case_insensitive() {
        assert!(mentions_music("TikTok dance challenges"));
        assert!(mentions_music("Instagram Reels"));
        assert!(!mentions_music("sustainable sneakers"));
    }

    #[tokio::test]
    async fn content_mode_inserts_music_call_before_matching_term() {
        let backend = ScriptedBackend::new(|req| {
            let prompt = req.prompt();
            Ok(if prompt.starts_with("Based on the website") {
                r#"{"searchTerms": ["TikTok music trends", "running shoes"]}"#.to_string()
            } else if prompt.contains("trending songs") {
                "Song A - Artist A".to_string()
            } else {
                format!("summary of {}", prompt.split('"').nth(1).unwrap_or("?"))
            })
        });

        let context = TrendProber::new(&backend, GenerationMode::Content).probe("https://nike.com", None).await;

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[1].contains("trending songs"));
        assert!(prompts[2].contains("\"TikTok music trends\""));
        assert!(prompts[3].contains("\"running shoes\""));
        assert!(context.starts_with("CURRENT TRENDS RESEARCH:\nCurrent trending music for Instagram/TikTok: Song A - Artist A\n\n"));
        assert!(context.contains("Latest trends for \"running shoes\": summary of running shoes"));
        assert!(backend.requests()[0].json_output);
    }

    #[tokio::test]
    async fn trends_mode_adds_general_ai_call() {
        let backend = ScriptedBackend::new(|req| {
            Ok(if req.prompt().starts_with("Based on the website") { r#"["generative design"]"#.to_string() } else { "ok".to_string() })
        });

        let context = TrendProber::new(&backend, GenerationMode::AiTrends).probe("https://nike.com", None).await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].max_tokens, 800);
        assert!(requests[2].prompt().starts_with("What are the latest ways AI"));
        assert!(context.starts_with("CURRENT AI TRENDS RESEARCH:\nLatest AI trends for \"generative design\": ok"));
        assert!(context.contains("AI in social media content creation: ok"));
    }

    #[tokio::test]
    async fn any_failure_yields_fallback() {
        let broken_terms = ScriptedBackend::new(|_| Ok("I cannot help with that".to_string()));
        let prober = TrendProber::new(&broken_terms, GenerationMode::Content);
        assert_eq!(prober.probe("https://nike.com", None).await, prober.fallback());

        let failing_followup = ScriptedBackend::new(|req| {
            if req.prompt().starts_with("Based on the website") {
                Ok(r#"["ai agents"]"#.to_string())
            } else {
                Err(OpenAiError::Http("connection reset".into()))
            }
        });
        let prober = TrendProber::new(&failing_followup, GenerationMode::AiTrends);
        assert_eq!(prober.probe("https://nike.com", None).await, prober.fallback());
        assert_eq!(failing_followup.prompts().len(), 2);
    }

    #[tokio::test]
    async fn requested_platform_narrows_term_prompt() {
        let backend = ScriptedBackend::new(|_| Err(OpenAiError::EmptyResponse));
        TrendProber::new(&backend, GenerationMode::Content).probe("https://nike.com", Some("LinkedIn")).await;
        assert!(backend.prompts()[0].contains("to create content for LinkedIn?"));
    }
}
