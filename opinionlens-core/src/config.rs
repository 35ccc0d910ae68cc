use crate::error::{ConfigError, CoreError};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k_comments() -> usize {
    20
}

fn default_max_videos_per_search() -> usize {
    10
}

fn default_max_comments_per_video() -> usize {
    100
}

/// Application configuration, loaded from an optional TOML file with
/// environment-variable overrides for secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k_comments")]
    pub top_k_comments: usize,
    #[serde(default = "default_max_videos_per_search")]
    pub max_videos_per_search: usize,
    #[serde(default = "default_max_comments_per_video")]
    pub max_comments_per_video: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            gemini_api_key: None,
            embedding_model: default_embedding_model(),
            llm_model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k_comments: default_top_k_comments(),
            max_videos_per_search: default_max_videos_per_search(),
            max_comments_per_video: default_max_comments_per_video(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `OPINIONLENS_CONFIG` (or `opinionlens.toml`
    /// if present), then applies environment overrides for API keys.
    pub fn load() -> Result<Self, CoreError> {
        let path = std::env::var("OPINIONLENS_CONFIG")
            .unwrap_or_else(|_| "opinionlens.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            info!("Loading configuration from {}", path);
            Self::from_file(&path)?
        } else {
            AppConfig::default()
        };

        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            config.youtube_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.gemini_api_key = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|_| {
            CoreError::Config(ConfigError::FileNotFound {
                path: path.to_string(),
            })
        })?;
        let config: AppConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "chunk_overlap ({}) must be smaller than chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            }
            .into());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "temperature".to_string(),
                value: self.temperature.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
