// AI invoke handler: validates, classifies, dispatches to one provider.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::claude::ClaudeClient;
use super::gemini::GeminiClient;
use super::model_router::{resolve_model, ProviderKind};
use super::openai::ChatCompletionsClient;
use super::AppState;
use crate::error::ApiError;

/// Substituted when OpenAI/Anthropic/xAI complete successfully but return
/// empty text. Gemini instead raises an error for the same condition.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str =
    "No response generated. Please try again or check your API keys.";

// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "memogate AI proxy",
        "endpoints": [
            "POST /api/ai/invoke",
            "GET /api/youtube/search",
            "GET /api/youtube/video",
            "GET /api/youtube/transcript",
            "GET /api/scrape"
        ]
    }))
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub model: Option<String>,
    pub prompt: Option<String>,
}

fn provider_key(state: &AppState, kind: ProviderKind) -> Result<String, ApiError> {
    let key = match kind {
        ProviderKind::OpenAi => &state.config.openai_api_key,
        ProviderKind::Anthropic => &state.config.anthropic_api_key,
        ProviderKind::Gemini => &state.config.google_api_key,
        ProviderKind::Xai => &state.config.xai_api_key,
    };
    key.clone().ok_or(ApiError::ProviderNotConfigured {
        provider: kind.label(),
        env_var: kind.env_var(),
    })
}

// POST /api/ai/invoke
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<Value>, ApiError> {
    let model = request
        .model
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or(ApiError::MissingParameter("model"))?;
    let prompt = request
        .prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingParameter("prompt"))?;

    let (model, kind) = resolve_model(model, &state.config);
    let kind = kind.ok_or_else(|| ApiError::UnsupportedModel {
        model: model.clone(),
    })?;
    let api_key = provider_key(&state, kind)?;

    tracing::info!(model = %model, provider = kind.label(), "dispatching AI request");

    let http = state.http.clone();
    let text = match kind {
        ProviderKind::OpenAi => {
            ChatCompletionsClient::openai(http, api_key)
                .complete(&model, prompt)
                .await?
        }
        ProviderKind::Xai => {
            ChatCompletionsClient::xai(http, api_key)
                .complete(&model, prompt)
                .await?
        }
        ProviderKind::Anthropic => ClaudeClient::new(http, api_key).complete(&model, prompt).await?,
        // Errors internally on empty text instead of using the placeholder.
        ProviderKind::Gemini => GeminiClient::new(http, api_key).complete(&model, prompt).await?,
    };

    Ok(Json(json!({ "response": finalize_response(text) })))
}

/// Substitute the placeholder for empty completion text. Gemini never reaches
/// this empty, its client errors instead.
fn finalize_response(text: String) -> String {
    if text.is_empty() {
        EMPTY_RESPONSE_PLACEHOLDER.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_completions_get_the_placeholder() {
        assert_eq!(finalize_response(String::new()), EMPTY_RESPONSE_PLACEHOLDER);
    }

    #[test]
    fn non_empty_completions_pass_through() {
        assert_eq!(finalize_response("Hello!".to_string()), "Hello!");
    }
}
