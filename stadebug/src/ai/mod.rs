pub mod groq;
pub mod heuristic;
pub mod prompts;
pub mod provider;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AIError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Missing API key or no provider available")]
    MissingApiKey,
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

// Re-export for convenience
pub use groq::GroqClassifier;
pub use heuristic::RuleBasedClassifier;
pub use prompts::{build_path_prompt, extract_json_from_text};
pub use provider::{ClassifierInfo, PathClassifier};
