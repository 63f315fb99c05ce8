use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-2024-11-20";

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    /// Output budget for the main generation call.
    pub max_tokens: u32,
    pub timeout: Duration,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 16_384,
            timeout: Duration::from_secs(600),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        Self {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: lookup("OPENAI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: lookup("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: parsed(&lookup, "OPENAI_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout: parsed::<u64>(&lookup, "OPENAI_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(defaults.timeout),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
        }
    }

    /// Key preview safe for logs.
    pub fn masked_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(7).collect::<String>()),
            None => "<none>".to_string(),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.masked_key(), "<none>");
    }

    #[test]
    fn overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-test-1234567890"),
            ("OPENAI_API_BASE", "http://localhost:9999/v1/"),
            ("OPENAI_MAX_TOKENS", "4096"),
            ("OPENAI_TIMEOUT_SECS", "soon"),
            ("PORT", "3000"),
        ]);
        assert_eq!(config.api_base, "http://localhost:9999/v1");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.port, 3000);
        assert_eq!(config.masked_key(), "sk-test...");
    }

    #[test]
    fn numeric_settings_parse_into_their_own_types() {
        let config = config_from(&[
            ("OPENAI_MAX_TOKENS", " 8000 "),
            ("OPENAI_TIMEOUT_SECS", "90"),
            ("PORT", "70000"),
        ]);
        assert_eq!(config.max_tokens, 8000u32);
        assert_eq!(config.timeout, Duration::from_secs(90));
        // out of range for u16
        assert_eq!(config.port, 8080u16);
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        assert_eq!(config_from(&[("OPENAI_API_KEY", "  ")]).api_key, None);
    }
}
