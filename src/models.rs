use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_with::{serde_as, skip_serializing_none, DefaultOnError, DeserializeAs, SerializeAs};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Body of `POST /api/generate-content` and `POST /api/generate-trends`.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub platform: Option<String>, // set by "regenerate" to focus on one platform
    #[serde(default)]
    pub briefing: Option<String>,
    #[serde(default)]
    pub target_audience_age: Option<String>,
    #[serde(default)]
    pub target_audience_interests: Option<String>,
    #[serde(default)]
    pub target_audience_needs: Option<String>,
    #[serde(default)]
    pub communication_tone: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl GenerationRequest {
    pub fn url(&self) -> Option<&str> { present(&self.url) }

    pub fn platform(&self) -> Option<&str> { present(&self.platform) }

    /// Optional briefing fields as `(label, value)` pairs, in prompt order, skipping blanks.
    pub fn context_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Briefing", &self.briefing),
            ("Target Audience Age", &self.target_audience_age),
            ("Target Audience Interests", &self.target_audience_interests),
            ("Target Audience Needs", &self.target_audience_needs),
            ("Communication Tone", &self.communication_tone),
        ]
        .into_iter()
        .filter_map(|(label, value)| present(value).map(|v| (label, v)))
        .collect()
    }
}

/// Which generator a request goes to. Selects endpoint, prompt wording and trend research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationMode {
    #[default]
    Content,
    AiTrends,
}

impl GenerationMode {
    pub fn endpoint(self) -> &'static str {
        match self {
            GenerationMode::Content => "/api/generate-content",
            GenerationMode::AiTrends => "/api/generate-trends",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            GenerationMode::Content => GenerationMode::AiTrends,
            GenerationMode::AiTrends => GenerationMode::Content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    YouTube,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Platform::Instagram, Platform::Facebook, Platform::YouTube, Platform::LinkedIn];

    /// Key used in the `content` object of a generation response.
    pub fn key(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::YouTube => "youtube",
            Platform::LinkedIn => "linkedin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::YouTube => "YouTube",
            Platform::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.display_name()) }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

// --- Generation response, as the client reads it ---
//
// The server forwards model output untouched; these types are only used on the
// client side after the shallow shape check, so every inner field is lenient.
// Leaves take whatever JSON the model produced and keep it as text, and a
// malformed branch decodes as its default instead of failing the whole document.

/// Reads any JSON value as display text.
pub struct LenientText;

/// Reads an array, a lone value or null as a list of display lines.
pub struct LenientList;

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

impl<'de> DeserializeAs<'de, String> for LenientText {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Value::deserialize(deserializer).map(|v| value_text(&v))
    }
}

impl SerializeAs<String> for LenientText {
    fn serialize_as<S: Serializer>(source: &String, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(source)
    }
}

impl<'de> DeserializeAs<'de, Vec<String>> for LenientList {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let lines: Vec<String> = match Value::deserialize(deserializer)? {
            Value::Array(items) => items.iter().map(value_text).collect(),
            Value::String(s) => s.lines().map(|l| l.trim().to_string()).collect(),
            other => vec![value_text(&other)],
        };
        Ok(lines.into_iter().filter(|l| !l.is_empty()).collect())
    }
}

impl SerializeAs<Vec<String>> for LenientList {
    fn serialize_as<S: Serializer>(source: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
        source.serialize(serializer)
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BrandAnalysis {
    #[serde_as(as = "LenientText")]
    pub name: String,
    #[serde_as(as = "LenientText")]
    pub domain: String,
    #[serde_as(as = "LenientText")]
    pub personality: String,
    #[serde_as(as = "LenientText")]
    pub tone: String,
    #[serde_as(as = "LenientText")]
    pub focus: String,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ContentItem {
    #[serde_as(as = "LenientText")]
    pub brief: String,
    #[serde_as(as = "DefaultOnError")]
    pub detailed: DetailedContent,
}

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedContent {
    #[serde_as(as = "LenientText")]
    pub focus: String,
    #[serde_as(as = "DefaultOnError<Vec<DefaultOnError>>")]
    pub ideas: Vec<Idea>,
    #[serde_as(as = "DefaultOnError<Option<BTreeMap<_, LenientText>>>")]
    pub stats: Option<BTreeMap<String, String>>,
    #[serde_as(as = "DefaultOnError")]
    pub content_mix: Option<ContentMix>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ContentMix {
    #[serde_as(as = "LenientList")]
    pub categories: Vec<String>,
    #[serde_as(as = "LenientList")]
    pub formats: Vec<String>,
}

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Idea {
    #[serde_as(as = "LenientText")]
    pub title: String,
    #[serde_as(as = "Option<LenientText>")]
    pub visual: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub caption: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub content: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub call_to_action: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub format: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub production_notes: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub outline: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub data_points: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub trend_analysis: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub conclusion: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub content_type: Option<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub duration: Option<String>,
    #[serde_as(as = "Option<LenientList>")]
    pub music_options: Option<Vec<String>>,
    #[serde_as(as = "DefaultOnError")]
    pub design_details: Option<DesignDetails>,
    /// Anything else the model chose to add.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignDetails {
    #[serde_as(as = "LenientList")]
    pub visual_elements: Vec<String>,
    #[serde_as(as = "LenientList")]
    pub technical_specs: Vec<String>,
    #[serde_as(as = "LenientList")]
    pub shot_list: Vec<String>,
    #[serde_as(as = "Option<LenientText>")]
    pub designer_notes: Option<String>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PlatformContent {
    #[serde_as(as = "DefaultOnError")]
    pub instagram: ContentItem,
    #[serde_as(as = "DefaultOnError")]
    pub facebook: ContentItem,
    #[serde_as(as = "DefaultOnError")]
    pub youtube: ContentItem,
    #[serde_as(as = "DefaultOnError")]
    pub linkedin: ContentItem,
}

impl PlatformContent {
    pub fn get(&self, platform: Platform) -> &ContentItem {
        match platform {
            Platform::Instagram => &self.instagram,
            Platform::Facebook => &self.facebook,
            Platform::YouTube => &self.youtube,
            Platform::LinkedIn => &self.linkedin,
        }
    }

    pub fn get_mut(&mut self, platform: Platform) -> &mut ContentItem {
        match platform {
            Platform::Instagram => &mut self.instagram,
            Platform::Facebook => &mut self.facebook,
            Platform::YouTube => &mut self.youtube,
            Platform::LinkedIn => &mut self.linkedin,
        }
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde_as(as = "DefaultOnError")]
    pub brand_analysis: BrandAnalysis,
    pub content: PlatformContent,
}

// --- Small response bodies ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ok,
    Error,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiStatus {
    pub status: StatusKind,
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}
