use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::StaDebugError;

/// Fetch a secret string by identifier.
pub trait SecretStore: Send + Sync {
    fn secret(&self, id: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, secret: impl Into<String>) {
        self.secrets.insert(id.into(), secret.into());
    }
}

impl SecretStore for MemorySecretStore {
    fn secret(&self, id: &str) -> Option<String> {
        self.secrets.get(id).cloned()
    }
}

/// One entry of an API key file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Read-only view of a JSON array of [`KeyEntry`] records.
#[derive(Debug, Clone, Default)]
pub struct JsonKeyFile {
    entries: Vec<KeyEntry>,
}

impl JsonKeyFile {
    pub fn load(path: &Path) -> Result<Self, StaDebugError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, StaDebugError> {
        let entries: Vec<KeyEntry> = serde_json::from_str(text)
            .map_err(|e| StaDebugError::Config(format!("invalid key file: {}", e)))?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// `name (masked key)` labels for display.
    pub fn labels(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| {
                let name = if e.name.is_empty() { "Unnamed" } else { e.name.as_str() };
                (e.id.clone(), format!("{} ({})", name, mask_key(&e.key)))
            })
            .collect()
    }
}

impl SecretStore for JsonKeyFile {
    fn secret(&self, id: &str) -> Option<String> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.key.clone())
    }
}

/// Show only the first and last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
