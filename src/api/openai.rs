// OpenAI-compatible chat completions client.
//
// xAI's Grok API speaks the same wire format, so the same client serves both
// providers with a different base URL and error label.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model_router::ProviderKind;
use crate::error::ApiError;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const XAI_API_BASE: &str = "https://api.x.ai/v1";

pub const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    provider: ProviderKind,
}

impl ChatCompletionsClient {
    pub fn openai(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            provider: ProviderKind::OpenAi,
        }
    }

    pub fn xai(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: XAI_API_BASE.to_string(),
            provider: ProviderKind::Xai,
        }
    }

    /// Send a single-turn prompt and return the trimmed completion text.
    /// Empty completions are returned as empty strings; the caller decides
    /// whether to substitute a placeholder.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String, ApiError> {
        let provider = self.provider.label();
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                provider,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_else(|_| Value::Object(Default::default()));
            let message = upstream_error_message(&body, status);
            return Err(ApiError::Upstream { provider, message });
        }

        let body: ChatResponse = response.json().await.map_err(|e| ApiError::Upstream {
            provider,
            message: format!("invalid response body: {e}"),
        })?;

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(text)
    }
}

/// Extract `error.message` from an upstream error body, falling back to the
/// HTTP status text when the body carries no usable message.
pub fn upstream_error_message(body: &Value, status: reqwest::StatusCode) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_upstream_body() {
        let body = json!({"error": {"message": "invalid api key"}});
        assert_eq!(
            upstream_error_message(&body, reqwest::StatusCode::UNAUTHORIZED),
            "invalid api key"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        let body = json!({});
        assert_eq!(
            upstream_error_message(&body, reqwest::StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
    }

    #[test]
    fn chat_response_tolerates_missing_choices() {
        let parsed: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.choices.is_empty());

        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": " Hello! "}}]
        }))
        .unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some(" Hello! ")
        );
    }
}
