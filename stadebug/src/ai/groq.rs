//! Groq chat-completions classifier
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint; Groq is the
//! default. One request per path, low temperature for stable triage labels.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ai::prompts::{build_path_prompt, extract_json_from_text};
use crate::ai::provider::{ClassifierInfo, PathClassifier};
use crate::ai::AIError;
use crate::config::ClassifierSettings;
use crate::parser::schema::TimingPath;
use crate::services::SecretStore;

const INITIAL_RETRY_DELAY_MS: u64 = 1000;
const MAX_TOKENS: u32 = 1024;

pub struct GroqClassifier {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_retries: u32,
}

impl GroqClassifier {
    pub fn new(api_key: String) -> Self {
        Self::with_settings(api_key, &ClassifierSettings::default())
    }

    pub fn with_settings(api_key: String, settings: &ClassifierSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
        }
    }

    /// Build a classifier with the key stored under `key_id`.
    pub fn from_store(
        store: &dyn SecretStore,
        key_id: &str,
        settings: &ClassifierSettings,
    ) -> Result<Self, AIError> {
        let key = store
            .secret(key_id)
            .filter(|k| !k.trim().is_empty())
            .ok_or(AIError::MissingApiKey)?;
        Ok(Self::with_settings(key, settings))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, prompt: &str) -> Result<String, AIError> {
        if self.api_key.is_empty() {
            return Err(AIError::MissingApiKey);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut retry_count = 0;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let chat: ChatResponse = resp
                            .json()
                            .await
                            .map_err(|e| AIError::ParseError(format!("Failed to parse JSON: {}", e)))?;

                        return chat
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                AIError::InvalidResponse("Empty choices array in response".to_string())
                            });
                    } else if status.as_u16() == 429 {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|h| h.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(delay_ms / 1000);

                        if retry_count < self.max_retries {
                            retry_count += 1;
                            tracing::warn!(
                                "Rate limited. Retrying after {} seconds (attempt {}/{})",
                                retry_after,
                                retry_count,
                                self.max_retries
                            );
                            sleep(Duration::from_secs(retry_after)).await;
                            delay_ms *= 2;
                            continue;
                        }
                        return Err(AIError::RateLimited { retry_after });
                    } else {
                        let message = resp
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(AIError::ApiError {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    if retry_count < self.max_retries {
                        retry_count += 1;
                        tracing::warn!(
                            "Request failed: {}. Retrying in {}ms (attempt {}/{})",
                            e,
                            delay_ms,
                            retry_count,
                            self.max_retries
                        );
                        sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms *= 2;
                        continue;
                    }
                    return Err(AIError::RequestFailed(e));
                }
            }
        }
    }
}

/// Turn a model reply into the JSON object it carries.
fn parse_classification(text: &str) -> Result<serde_json::Value, AIError> {
    let json = extract_json_from_text(text)
        .ok_or_else(|| AIError::InvalidResponse("no JSON object in model reply".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| AIError::ParseError(format!("Failed to parse model reply: {}", e)))?;

    if !value.is_object() {
        return Err(AIError::InvalidResponse("model reply is not a JSON object".to_string()));
    }
    Ok(value)
}

#[async_trait]
impl PathClassifier for GroqClassifier {
    fn name(&self) -> &str {
        "groq"
    }

    async fn classify(&self, path: &TimingPath) -> Result<serde_json::Value, AIError> {
        let prompt = build_path_prompt(path);
        tracing::debug!("Classifying {} -> {} with {}", path.startpoint, path.endpoint, self.model);
        let reply = self.send_request(&prompt).await?;
        parse_classification(&reply)
    }

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            provider: "groq".to_string(),
            model_name: self.model.clone(),
            is_local: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}
