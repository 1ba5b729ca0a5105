//! Path classifier trait
//!
//! The boundary between the pipeline and whatever produces root-cause
//! classifications (an LLM, a rule set, a test double).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::AIError;
use crate::parser::schema::TimingPath;

/// Information about a classifier backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierInfo {
    /// Provider name (e.g., "groq", "offline")
    pub provider: String,

    /// Model name, or a rule-set identifier for offline classifiers
    pub model_name: String,

    /// Whether classification runs without network access
    pub is_local: bool,
}

/// Common trait for all classifiers.
///
/// `classify` returns the raw JSON object produced by the backend. It is
/// coerced into a typed [`Classification`](crate::report::Classification)
/// by the assembler, which also overwrites any identity fields it echoes.
#[async_trait]
pub trait PathClassifier: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Classify one timing path
    async fn classify(&self, path: &TimingPath) -> Result<serde_json::Value, AIError>;

    /// Get backend info
    fn info(&self) -> ClassifierInfo;
}
