// Google Generative Language API client.
//
// Gemini is the one provider with a fallback chain: legacy model names are
// remapped to their current aliases, and a 404 walks an ordered list of
// (model, api-version) attempts before giving up. The plan is built up front
// so the retry behavior is testable without network I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::openai::{upstream_error_message, MAX_TOKENS};
use crate::error::ApiError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Legacy model names Google has retired, mapped to their current aliases.
static MODEL_ALIASES: &[(&str, &str)] = &[
    ("gemini-pro", "gemini-flash-latest"),
    ("gemini-1.5-flash", "gemini-flash-latest"),
    ("gemini-1.5-pro", "gemini-pro-latest"),
];

/// One upstream attempt: a concrete model id against a specific API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiAttempt {
    pub model: String,
    pub api_version: &'static str,
}

/// Remap retired model names to their current aliases.
pub fn remap_model(model: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == model)
        .map(|(_, current)| *current)
        .unwrap_or(model)
}

/// Build the ordered attempt list for a requested model. Each attempt is only
/// reached when the previous one 404s; any other failure surfaces immediately.
pub fn attempt_plan(requested: &str) -> Vec<GeminiAttempt> {
    let model = remap_model(requested);
    let mut plan = vec![
        GeminiAttempt {
            model: model.to_string(),
            api_version: "v1beta",
        },
        GeminiAttempt {
            model: model.to_string(),
            api_version: "v1",
        },
    ];
    // Google briefly published this one only under its versioned id.
    if requested == "gemini-1.5-flash" {
        plan.push(GeminiAttempt {
            model: "gemini-1.5-flash-002".to_string(),
            api_version: "v1beta",
        });
    }
    plan
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Send a single-turn prompt, walking the attempt plan on 404s.
    /// A successful call with empty extracted text is an error here, unlike
    /// the other providers where the handler substitutes a placeholder.
    pub async fn complete(&self, requested_model: &str, prompt: &str) -> Result<String, ApiError> {
        let plan = attempt_plan(requested_model);
        let last = plan.len() - 1;

        for (i, attempt) in plan.iter().enumerate() {
            match self.generate(attempt, prompt).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        return Err(ApiError::EmptyUpstreamResponse {
                            model: attempt.model.clone(),
                        });
                    }
                    return Ok(text);
                }
                Err(GenerateError::NotFound) if i < last => {
                    tracing::warn!(
                        model = %attempt.model,
                        api_version = attempt.api_version,
                        "Gemini model not found, trying next attempt"
                    );
                }
                Err(GenerateError::NotFound) => {
                    return Err(ApiError::Upstream {
                        provider: "Gemini",
                        message: format!(
                            "model {} not found (last tried API {})",
                            attempt.model, attempt.api_version
                        ),
                    });
                }
                Err(GenerateError::Other(err)) => return Err(err),
            }
        }

        unreachable!("attempt plan is never empty")
    }

    async fn generate(&self, attempt: &GeminiAttempt, prompt: &str) -> Result<String, GenerateError> {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, attempt.api_version, attempt.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: MAX_TOKENS,
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                GenerateError::Other(ApiError::Upstream {
                    provider: "Gemini",
                    message: e.to_string(),
                })
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GenerateError::NotFound);
        }
        if !status.is_success() {
            let body: Value = response
                .json()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            return Err(GenerateError::Other(ApiError::Upstream {
                provider: "Gemini",
                message: upstream_error_message(&body, status),
            }));
        }

        let body: GeminiResponse = response.json().await.map_err(|e| {
            GenerateError::Other(ApiError::Upstream {
                provider: "Gemini",
                message: format!("invalid response body: {e}"),
            })
        })?;

        Ok(body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or("")
            .to_string())
    }
}

enum GenerateError {
    NotFound,
    Other(ApiError),
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaps_retired_model_names() {
        assert_eq!(remap_model("gemini-pro"), "gemini-flash-latest");
        assert_eq!(remap_model("gemini-1.5-flash"), "gemini-flash-latest");
        assert_eq!(remap_model("gemini-1.5-pro"), "gemini-pro-latest");
        assert_eq!(remap_model("gemini-flash-latest"), "gemini-flash-latest");
    }

    #[test]
    fn plan_tries_v1beta_then_v1() {
        let plan = attempt_plan("gemini-flash-latest");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].api_version, "v1beta");
        assert_eq!(plan[0].model, "gemini-flash-latest");
        assert_eq!(plan[1].api_version, "v1");
        assert_eq!(plan[1].model, "gemini-flash-latest");
    }

    #[test]
    fn plan_adds_versioned_id_for_legacy_flash() {
        let plan = attempt_plan("gemini-1.5-flash");
        assert_eq!(plan.len(), 3);
        // Remapped alias first, on both API versions.
        assert_eq!(plan[0].model, "gemini-flash-latest");
        assert_eq!(plan[1].model, "gemini-flash-latest");
        // Then the explicit versioned id, back on v1beta.
        assert_eq!(plan[2].model, "gemini-1.5-flash-002");
        assert_eq!(plan[2].api_version, "v1beta");
    }

    #[test]
    fn plan_has_no_extra_attempt_for_other_legacy_names() {
        assert_eq!(attempt_plan("gemini-pro").len(), 2);
        assert_eq!(attempt_plan("gemini-1.5-pro").len(), 2);
    }

    #[test]
    fn response_extraction_survives_sparse_bodies() {
        let parsed: GeminiResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.candidates.is_empty());

        let parsed: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "hi"}]}}]
        }))
        .unwrap();
        assert_eq!(
            parsed.candidates[0].content.parts[0].text.as_deref(),
            Some("hi")
        );
    }
}
