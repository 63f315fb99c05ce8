use crate::models::{GenerationMode, GenerationRequest, Platform};
use serde_json::{json, Value};

pub const IDEAS_PER_PLATFORM: usize = 6;

/// Builds the system prompt for the main generation call.
///
/// Output is a pure function of its inputs; the JSON shape the model must
/// return is only described in prose, never checked afterwards.
pub fn build_prompt(request: &GenerationRequest, url: &str, trends_context: &str, mode: GenerationMode) -> String {
    let ai = mode == GenerationMode::AiTrends;
    let requested = request.platform().map(platform_label);
    let target = requested.clone().unwrap_or_else(|| "all social media platforms".to_string());
    let platform_list = requested.clone().unwrap_or_else(|| "Instagram, Facebook, YouTube, and LinkedIn".to_string());

    let additional_context: String = request
        .context_fields()
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}\n"))
        .collect();

    let role = if ai {
        format!("You are a professional AI trends analyst and social media strategist. Analyze the website at {url} and generate tailored AI trend content ideas for {target}.")
    } else {
        format!("You are a professional content strategist and social media manager. Analyze the website at {url} and generate tailored content ideas for {target}.")
    };

    let mut tasks: Vec<String> = Vec::new();
    if ai {
        tasks.push("Analyze the website to understand the brand's industry, offerings, and target audience.".into());
        tasks.push("Identify how AI technology is relevant to this industry or business.".into());
        tasks.push(format!("Based on this analysis, create a detailed AI trend content strategy for {platform_list}."));
        tasks.push(format!("For each platform, generate EXACTLY {IDEAS_PER_PLATFORM} distinct and diverse AI-focused content ideas that align with the brand's business and goals. This is a CRITICAL requirement - you MUST create {IDEAS_PER_PLATFORM} ideas for each platform, not more, not less."));
        tasks.push("Include creative elements and strategic recommendations that highlight cutting-edge AI applications.".into());
    } else {
        tasks.push("Analyze the website to understand the brand's voice, offerings, and target audience.".into());
        tasks.push(format!("Based on this analysis, create a detailed content strategy for {platform_list}."));
        tasks.push(format!("For each platform, generate EXACTLY {IDEAS_PER_PLATFORM} distinct and diverse content ideas that align with the brand's identity and goals. This is a CRITICAL requirement - you MUST create {IDEAS_PER_PLATFORM} ideas for each platform, not more, not less."));
        tasks.push("Include creative elements and strategic recommendations.".into());
    }
    tasks.push("EXTREMELY IMPORTANT: Provide exceptionally detailed content for each idea. Every idea must include comprehensive design details with COMPLETE shot lists, technical specifications, and designer notes. These should be extremely thorough with multiple paragraphs of detail.".into());
    tasks.push(format!("Ensure each platform's content leverages the unique features of that platform and incorporates current {}trends.", if ai { "AI " } else { "" }));
    let tasks: String = tasks.iter().enumerate().map(|(i, t)| format!("{}. {}\n", i + 1, t)).collect();

    let focus_rule = match &requested {
        Some(p) => format!("A specific platform is requested ({p}): focus solely on that platform but still provide EXACTLY {IDEAS_PER_PLATFORM} ideas with maximum detail for each. Keep the full JSON structure below."),
        None => format!("If a specific platform is requested, focus solely on that platform but still provide EXACTLY {IDEAS_PER_PLATFORM} ideas with maximum detail for each."),
    };

    let breakdown: String = Platform::ALL
        .iter()
        .map(|p| format!("- {}: EXACTLY {IDEAS_PER_PLATFORM} detailed {}ideas\n", p.display_name(), if ai { "AI-focused " } else { "" }))
        .collect();

    let template = serde_json::to_string_pretty(&response_template(mode)).unwrap_or_default();

    format!(
        "{role}\n\n{additional_context}\n{trends_context}\n\nYour task:\n{tasks}\n{focus_rule}\n\nTHE EXACT BREAKDOWN REQUIRED:\n{breakdown}\n\
        Return your response in a JSON format with the following structure. Each \"ideas\" array shows one example entry; \
        repeat that entry shape for all {IDEAS_PER_PLATFORM} ideas:\n{template}"
    )
}

/// Display name for known platforms, the raw text otherwise.
fn platform_label(raw: &str) -> String {
    raw.parse::<Platform>().map(|p| p.display_name().to_string()).unwrap_or_else(|_| raw.to_string())
}

/// Example response object shown to the model.
pub fn response_template(mode: GenerationMode) -> Value {
    let ai = mode == GenerationMode::AiTrends;
    let pick = |plain: &'static str, trend: &'static str| if ai { trend } else { plain };
    let title = pick("Content idea title", "AI trend content idea title");
    let categories = if ai {
        json!(["AI Category 1", "AI Category 2", "AI Category 3", "AI Category 4"])
    } else {
        json!(["Category 1", "Category 2", "Category 3", "Category 4"])
    };
    let content_mix = json!({ "categories": categories, "formats": ["Format 1", "Format 2", "Format 3", "Format 4"] });

    let section = |platform: Platform, idea: Value, stats: Value| {
        let name = platform.display_name();
        let (brief, focus) = if ai {
            (format!("Comprehensive AI trend strategy for {name}"), format!("Key AI focus area for {name}"))
        } else {
            (format!("Comprehensive strategy for {name}"), format!("Key focus area for {name}"))
        };
        json!({
            "brief": brief,
            "detailed": {
                "focus": focus,
                "ideas": [idea],
                "stats": stats,
                "contentMix": content_mix.clone(),
            }
        })
    };

    let instagram = section(
        Platform::Instagram,
        json!({
            "title": title,
            "visual": pick("Detailed visual concept description", "Detailed visual concept description incorporating AI"),
            "caption": pick("Full suggested caption with hashtags", "Full suggested caption highlighting AI with hashtags"),
            "contentType": "reel or post",
            "duration": "For reels (e.g., 15-30 seconds)",
            "musicOptions": ["Trending song 1 - Artist", "Trending song 2 - Artist"],
            "designDetails": {
                "visualElements": ["Element 1 with detail", "Element 2 with detail", "Element 3 with detail"],
                "technicalSpecs": ["Spec 1: Full description", "Spec 2: Full description", "Aspect Ratio: 9:16", "Resolution: 1080x1920", "Frame Rate: 30fps", "Color Palette: specific colors"],
                "shotList": ["Shot 1: Extremely detailed description", "Shot 2: Extremely detailed description", "Shot 3: Extremely detailed description", "Shot 4: Extremely detailed description"],
                "designerNotes": pick(
                    "Comprehensive notes for design approach, style guidance, and implementation tips including fonts, colors, and visual style",
                    "Comprehensive notes for AI-focused design approach, style guidance, and implementation tips"
                ),
            }
        }),
        json!({
            "engagementRate": pick("Estimated engagement rate", "Estimated engagement rate for AI content"),
            "bestContentType": pick("Best performing content type", "Best performing AI content type"),
            "optimalPosting": "Optimal posting time",
            "averageViewDuration": "Average view duration for video content",
            "bestVideoType": "Best performing video type",
        }),
    );

    let facebook = section(
        Platform::Facebook,
        json!({
            "title": title,
            "content": pick("Full post content with engaging text", "Full post content about AI with engaging text"),
            "callToAction": "Detailed call to action",
            "designDetails": {
                "visualElements": ["Element 1 with detail", "Element 2 with detail", "Element 3 with detail"],
                "technicalSpecs": ["Spec 1: Full description", "Spec 2: Full description", "Aspect Ratio: 16:9", "Resolution: 1200x628", "Color Profile: sRGB"],
                "shotList": ["Shot 1: Extremely detailed description", "Shot 2: Extremely detailed description", "Shot 3: Extremely detailed description"],
                "designerNotes": pick(
                    "Comprehensive notes for design approach, style guidance, and implementation tips including fonts, colors, and visual style",
                    "Comprehensive notes for AI-focused design approach, style guidance, and implementation tips"
                ),
            }
        }),
        json!({
            "engagementRate": "Estimated engagement rate",
            "clickThroughRate": "Estimated click-through rate",
            "optimalPosting": "Optimal posting time",
            "bestContentType": pick("Best performing content type", "Best performing AI content type"),
        }),
    );

    let youtube = section(
        Platform::YouTube,
        json!({
            "title": title,
            "format": "Detailed video format description",
            "productionNotes": pick("Comprehensive production suggestions", "Comprehensive production suggestions for AI content"),
            "outline": pick("Detailed video outline with sections", "Detailed video outline focusing on AI with sections"),
            "contentType": "shorts or long-form",
            "duration": "Suggested duration",
            "designDetails": {
                "visualElements": ["Element 1 with detail", "Element 2 with detail", "Element 3 with detail", "Key visual themes with descriptions"],
                "technicalSpecs": ["Spec 1: Full description", "Spec 2: Full description", "Aspect Ratio: 16:9", "Resolution: 1920x1080", "Audio Quality: 48kHz stereo", "Lighting: detailed requirements"],
                "shotList": ["Shot 1: Extremely detailed description", "Shot 2: Extremely detailed description", "Shot 3: Extremely detailed description", "Shot 4: Extremely detailed description", "Shot 5: Extremely detailed description"],
                "designerNotes": pick(
                    "Comprehensive notes for visual style, editing approach, and production techniques including transitions, effects, and graphics",
                    "Comprehensive notes for AI-focused visual style, editing approach, and production techniques"
                ),
            }
        }),
        json!({
            "averageViewDuration": "Estimated average view duration",
            "clickThroughRate": "Estimated click-through rate",
            "subscriberConversion": "Estimated subscriber conversion rate",
            "bestVideoType": pick("Best performing video type", "Best performing AI video type"),
            "optimalLength": "Optimal video length",
        }),
    );

    let linkedin = section(
        Platform::LinkedIn,
        json!({
            "title": title,
            "content": pick("Full post content with professional tone", "Full post content about AI trends with professional tone"),
            "dataPoints": pick("Detailed key data points to include", "Detailed key AI data points to include"),
            "trendAnalysis": pick("In-depth analysis of industry trends", "In-depth analysis of AI industry trends"),
            "conclusion": pick("Comprehensive concluding thoughts", "Comprehensive concluding thoughts on AI implications"),
            "callToAction": "Professional call to action",
            "designDetails": {
                "visualElements": ["Element 1 with detail", "Element 2 with detail", "Element 3 with detail", "Professional graphic elements with descriptions"],
                "technicalSpecs": ["Spec 1: Full description", "Spec 2: Full description", "Aspect Ratio: 1200x627", "Format: PNG or PDF for documents", "Color Profile: sRGB"],
                "shotList": ["Shot/Section 1: Extremely detailed description", "Shot/Section 2: Extremely detailed description", "Shot/Section 3: Extremely detailed description"],
                "designerNotes": pick(
                    "Comprehensive notes about professional styling, branding consistency, and corporate design elements including typography, color scheme, and layout",
                    "Comprehensive notes about AI-focused professional styling, branding consistency, and corporate design elements"
                ),
            }
        }),
        json!({
            "engagementRate": "Estimated engagement rate",
            "impressions": "Estimated impressions",
            "clickThroughRate": "Estimated click-through rate",
            "leadGeneration": "Estimated lead generation potential",
            "optimalPosting": "Optimal posting time",
        }),
    );

    json!({
        "brandAnalysis": {
            "name": "Brand Name",
            "domain": "domain.com",
            "personality": "Detailed description of brand voice/personality",
            "tone": "Formal/casual/etc.",
            "focus": "Main product/service focus",
        },
        "content": {
            "instagram": instagram,
            "facebook": facebook,
            "youtube": youtube,
            "linkedin": linkedin,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationResponse;
    use pretty_assertions::assert_eq;

    fn request() -> GenerationRequest {
        GenerationRequest {
            url: Some("https://nike.com".into()),
            briefing: Some("Spring running campaign".into()),
            target_audience_needs: Some("  ".into()),
            communication_tone: Some("Energetic".into()),
            ..Default::default()
        }
    }

    #[test]
    fn includes_only_present_context_lines() {
        let prompt = build_prompt(&request(), "https://nike.com", "TRENDS HERE", GenerationMode::Content);
        assert!(prompt.starts_with("You are a professional content strategist and social media manager. Analyze the website at https://nike.com and generate tailored content ideas for all social media platforms.\n\nBriefing: Spring running campaign\nCommunication Tone: Energetic\n\nTRENDS HERE\n\n"));
        assert!(!prompt.contains("Target Audience Needs"));
        assert!(!prompt.contains("Target Audience Age"));
    }

    #[test]
    fn is_deterministic() {
        let a = build_prompt(&request(), "https://nike.com", "t", GenerationMode::AiTrends);
        let b = build_prompt(&request(), "https://nike.com", "t", GenerationMode::AiTrends);
        assert_eq!(a, b);
    }

    #[test]
    fn names_every_platform_with_six_ideas() {
        let prompt = build_prompt(&request(), "https://nike.com", "", GenerationMode::Content);
        for line in ["- Instagram: EXACTLY 6 detailed ideas", "- Facebook: EXACTLY 6 detailed ideas", "- YouTube: EXACTLY 6 detailed ideas", "- LinkedIn: EXACTLY 6 detailed ideas"] {
            assert!(prompt.contains(line), "missing {line}");
        }
    }

    #[test]
    fn ai_mode_uses_trend_wording() {
        let prompt = build_prompt(&request(), "https://nike.com", "", GenerationMode::AiTrends);
        assert!(prompt.starts_with("You are a professional AI trends analyst"));
        assert!(prompt.contains("2. Identify how AI technology is relevant to this industry or business."));
        assert!(prompt.contains("- LinkedIn: EXACTLY 6 detailed AI-focused ideas"));
        assert!(prompt.contains("AI trend content idea title"));
    }

    #[test]
    fn requested_platform_is_named() {
        let req = GenerationRequest { platform: Some("youtube".into()), ..request() };
        let prompt = build_prompt(&req, "https://nike.com", "", GenerationMode::Content);
        assert!(prompt.contains("generate tailored content ideas for YouTube."));
        assert!(prompt.contains("A specific platform is requested (YouTube)"));
    }

    #[test]
    fn template_matches_client_shape() {
        for mode in [GenerationMode::Content, GenerationMode::AiTrends] {
            let template = response_template(mode);
            let keys: Vec<&String> = template["content"].as_object().unwrap().keys().collect();
            assert_eq!(keys, vec!["instagram", "facebook", "youtube", "linkedin"]);
            let parsed: GenerationResponse = serde_json::from_value(template).unwrap();
            assert_eq!(parsed.content.youtube.detailed.ideas[0].content_type.as_deref(), Some("shorts or long-form"));
            assert_eq!(parsed.content.linkedin.detailed.stats.as_ref().map(|s| s.len()), Some(5));
        }
    }
}
