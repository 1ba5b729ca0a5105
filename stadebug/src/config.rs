//! Classifier configuration, loaded from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::StaDebugError;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    Offline,
}

/// Settings for the path classifier. Every field has a default, so a
/// config file only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Path to an API key file (`[{id, name, key, ...}]`).
    pub key_file: Option<PathBuf>,
    pub key_id: Option<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Groq,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            max_retries: 3,
            key_file: None,
            key_id: None,
        }
    }
}

impl ClassifierSettings {
    pub fn load(path: &Path) -> Result<Self, StaDebugError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| StaDebugError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
