//! Generative assistant client.
//!
//! Thin proxy over a Gemini-style `generateContent` endpoint. The chat
//! handler builds the prompt; this module only ships it and extracts the
//! text of the first candidate.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Assistant call failures.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant provider unreachable: {0}")]
    Transport(String),

    #[error("assistant provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed assistant response: {0}")]
    Malformed(String),
}

/// Prompt-in, text-out completion provider.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Extract the first candidate's text from a `generateContent` response.
fn extract_text(response: &Value) -> Result<String, AssistantError> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AssistantError::Malformed("missing candidates[0].content.parts[0].text".to_string())
        })
}

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build assistant HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AssistantProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 200 }
        });

        debug!("Sending assistant request ({} chars)", prompt.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status,
                body: body.chars().take(500).collect(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Malformed(e.to_string()))?;
        extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Flight PS101 departs on time." }] } }
            ]
        });
        assert_eq!(
            extract_text(&body).unwrap(),
            "Flight PS101 departs on time."
        );
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let err = extract_text(&json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, AssistantError::Malformed(_)));
    }
}
