// Anthropic Messages API client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::openai::{upstream_error_message, MAX_TOKENS};
use crate::error::ApiError;

const CLAUDE_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: CLAUDE_API_BASE.to_string(),
        }
    }

    /// Send a single-turn prompt and return the trimmed completion text.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String, ApiError> {
        let request = ClaudeRequest {
            model: model.to_string(),
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                provider: "Anthropic",
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response
                .json()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            return Err(ApiError::Upstream {
                provider: "Anthropic",
                message: upstream_error_message(&body, status),
            });
        }

        let body: ClaudeResponse = response.json().await.map_err(|e| ApiError::Upstream {
            provider: "Anthropic",
            message: format!("invalid response body: {e}"),
        })?;

        let text = body
            .content
            .first()
            .and_then(|c| c.text.as_deref())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_content_block_text() {
        let parsed: ClaudeResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "  Hello from Claude  "}]
        }))
        .unwrap();
        assert_eq!(
            parsed.content[0].text.as_deref(),
            Some("  Hello from Claude  ")
        );
    }

    #[test]
    fn tolerates_empty_content() {
        let parsed: ClaudeResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.content.is_empty());
    }
}
