// Error taxonomy for the gateway
//
// Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl is the
// single place errors become HTTP. Bodies always carry at least an `error`
// string; some variants attach diagnostic fields the frontend displays
// (`videoId`, `url`, `suggestion`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde_json::json;
use thiserror::Error;

/// Whether error responses include a `details` field with the source chain.
/// Set once at startup from `Config.development`.
static DEV_MODE: OnceCell<bool> = OnceCell::new();

pub fn set_dev_mode(enabled: bool) {
    DEV_MODE.set(enabled).ok();
}

fn dev_mode() -> bool {
    DEV_MODE.get().copied().unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unsupported model: {model}. Supported: gpt-*, claude-*, gemini-*, grok-*")]
    UnsupportedModel { model: String },

    #[error("{provider} API key not configured. Set {env_var} on the server.")]
    ProviderNotConfigured {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("{provider} API error: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    #[error("Gemini returned an empty response for model {model}")]
    EmptyUpstreamResponse { model: String },

    #[error("Video not found or unavailable")]
    VideoNotFound { video_id: String },

    #[error("Transcript unavailable for this video")]
    TranscriptUnavailable {
        video_id: String,
        reason: String,
        suggestion: Option<String>,
    },

    #[error("No meaningful content could be extracted from this page")]
    NoMeaningfulContent { url: String },

    #[error("Failed to fetch URL: HTTP {status}")]
    ScrapeFailed { url: String, status: u16 },

    /// YouTube Data API failure already classified to a client-facing status.
    #[error("YouTube API error: {message}")]
    YouTube { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::UnsupportedModel { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::VideoNotFound { .. }
            | ApiError::TranscriptUnavailable { .. }
            | ApiError::NoMeaningfulContent { .. } => StatusCode::NOT_FOUND,
            ApiError::YouTube { status, .. } => *status,
            ApiError::ProviderNotConfigured { .. }
            | ApiError::Upstream { .. }
            | ApiError::EmptyUpstreamResponse { .. }
            | ApiError::ScrapeFailed { .. }
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "error": self.to_string() });

        match &self {
            ApiError::VideoNotFound { video_id } => {
                body["videoId"] = json!(video_id);
            }
            ApiError::TranscriptUnavailable {
                video_id,
                reason,
                suggestion,
            } => {
                body["videoId"] = json!(video_id);
                body["details"] = json!(reason);
                if let Some(suggestion) = suggestion {
                    body["suggestion"] = json!(suggestion);
                }
            }
            ApiError::NoMeaningfulContent { url } | ApiError::ScrapeFailed { url, .. } => {
                body["url"] = json!(url);
            }
            ApiError::Internal(err) if dev_mode() => {
                body["details"] = json!(format!("{err:?}"));
            }
            _ => {}
        }

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_400() {
        assert_eq!(
            ApiError::MissingParameter("model").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UnsupportedModel {
                model: "llama-3".to_string()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_found_family_is_404() {
        assert_eq!(
            ApiError::VideoNotFound {
                video_id: "abc".to_string()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::NoMeaningfulContent {
                url: "https://example.com".to_string()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn classified_youtube_errors_keep_their_status() {
        let err = ApiError::YouTube {
            status: StatusCode::FORBIDDEN,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn provider_not_configured_names_the_env_var() {
        let err = ApiError::ProviderNotConfigured {
            provider: "OpenAI",
            env_var: "OPENAI_API_KEY",
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
