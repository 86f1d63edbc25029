//! Client configuration loaded from the environment.

use lesson_core::ComparisonMode;
use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TTS_LANGUAGE: &str = "he-IL";
const DEFAULT_REVIEW_LIMIT: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings for the lesson client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub user_id: Option<String>,
    pub tts_language: String,
    pub comparison_mode: ComparisonMode,
    pub review_limit: usize,
    /// Command that plays an audio file passed as its last argument.
    pub audio_player: Option<String>,
    /// Command that speaks text passed as its last argument.
    pub speech_fallback: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_id: None,
            tts_language: DEFAULT_TTS_LANGUAGE.to_string(),
            comparison_mode: ComparisonMode::default(),
            review_limit: DEFAULT_REVIEW_LIMIT,
            audio_player: None,
            speech_fallback: None,
        }
    }
}

impl ClientConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let comparison_mode = match get("ANSWER_MATCHING") {
            Some(value) => ComparisonMode::from_str(&value).ok_or(ConfigError::Invalid {
                key: "ANSWER_MATCHING",
                value,
            })?,
            None => defaults.comparison_mode,
        };

        let review_limit = match get("REVIEW_LIMIT") {
            Some(value) => match value.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "REVIEW_LIMIT",
                        value,
                    })
                }
            },
            None => defaults.review_limit,
        };

        Ok(Self {
            api_base_url: get("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            user_id: get("HEBREW_USER_ID"),
            tts_language: get("TTS_LANGUAGE").unwrap_or(defaults.tts_language),
            comparison_mode,
            review_limit,
            audio_player: get("AUDIO_PLAYER"),
            speech_fallback: get("SPEECH_FALLBACK"),
        })
    }
}
