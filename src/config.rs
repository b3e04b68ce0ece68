//! Classifier configuration: artifact locations, explanation cache and explainer, logging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Pretrained vocabulary and classifier parameters
    pub artifacts: ArtifactsConfig,
    /// Explanation cache backend
    pub cache: CacheConfig,
    /// External explanation generator
    pub explainer: ExplainerConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub vocabulary_path: PathBuf,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// SQLite file when `backend` is `sqlite`
    pub path: PathBuf,
    /// Environment variable holding the secret the at-rest key is derived from
    pub secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable holding the API key; the key itself never lives in config
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Email text beyond this many characters is not sent
    pub max_text_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            vocabulary_path: PathBuf::from("models/vocabulary.json"),
            model_path: PathBuf::from("models/classifier.json"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .map(|d| d.join("salain"))
            .unwrap_or_else(|| PathBuf::from(".salain"));
        Self {
            backend: CacheBackend::Memory,
            path: dir.join("explanations.db"),
            secret_env: "SALAIN_CACHE_SECRET".to_string(),
        }
    }
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.anthropic.com".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            timeout_secs: 30,
            max_text_chars: 3000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ClassifierConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ClassifierConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
