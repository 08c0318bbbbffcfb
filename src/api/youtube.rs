// YouTube Data API adapter: video search and metadata lookup.
//
// Upstream errors are classified by YouTube's `error.errors[0].reason` into
// client-facing statuses. A 200 with an empty `items` array is deliberately
// treated as "video not found" even though genuine errors go through the
// reason mapping; that mirrors how the Data API actually behaves for unknown
// ids.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

/// Parse an ISO-8601 duration (`PT#H#M#S`) into total seconds.
pub fn parse_duration(iso: &str) -> u64 {
    let Some(caps) = DURATION_RE.captures(iso) else {
        return 0;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1) * 3600 + part(2) * 60 + part(3)
}

/// Format seconds as `H:MM:SS`, or `MM:SS` with zero-padded minutes when
/// under an hour.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    async fn list(&self, resource: &str, params: &[(&str, &str)]) -> Result<Vec<Value>, ApiError> {
        let response = self
            .http
            .get(format!("{YOUTUBE_API_BASE}/{resource}"))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                provider: "YouTube",
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response
                .json()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            return Err(classify_error(status, &body));
        }

        let body: ListResponse = response.json().await.map_err(|e| ApiError::Upstream {
            provider: "YouTube",
            message: format!("invalid response body: {e}"),
        })?;
        Ok(body.items)
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Value>, ApiError> {
        self.list(
            "search",
            &[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", &max_results.to_string()),
            ],
        )
        .await
    }

    pub async fn video(&self, id: &str, part: &str) -> Result<Option<Value>, ApiError> {
        let items = self.list("videos", &[("part", part), ("id", id)]).await?;
        Ok(items.into_iter().next())
    }
}

/// Map a Data API error body to a client-facing status by its reason code.
fn classify_error(status: reqwest::StatusCode, body: &Value) -> ApiError {
    let reason = body
        .pointer("/error/errors/0/reason")
        .and_then(Value::as_str)
        .unwrap_or("");
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
        .to_string();

    let mapped = match reason {
        "quotaExceeded" => axum::http::StatusCode::FORBIDDEN,
        "keyInvalid" => axum::http::StatusCode::UNAUTHORIZED,
        "videoNotFound" => axum::http::StatusCode::NOT_FOUND,
        "forbidden" => axum::http::StatusCode::FORBIDDEN,
        _ => axum::http::StatusCode::from_u16(status.as_u16())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    };

    ApiError::YouTube {
        status: mapped,
        message,
    }
}

fn require_key(state: &AppState) -> Result<YouTubeClient, ApiError> {
    let api_key = state
        .config
        .youtube_api_key
        .clone()
        .ok_or(ApiError::ProviderNotConfigured {
            provider: "YouTube",
            env_var: "YOUTUBE_API_KEY",
        })?;
    Ok(YouTubeClient::new(state.http.clone(), api_key))
}

fn pick_thumbnail(snippet: &Value) -> String {
    snippet
        .pointer("/thumbnails/medium/url")
        .or_else(|| snippet.pointer("/thumbnails/default/url"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn snippet_str(snippet: &Value, field: &str) -> String {
    snippet
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

// GET /api/youtube/search

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = params
        .q
        .as_deref()
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingParameter("q"))?;
    let client = require_key(&state)?;

    tracing::info!(query, "searching YouTube");
    let items = client.search(query, params.max_results.unwrap_or(10)).await?;

    let videos: Vec<SearchResult> = items
        .iter()
        .filter_map(|item| {
            let video_id = item.pointer("/id/videoId")?.as_str()?.to_string();
            let snippet = item.get("snippet")?;
            Some(SearchResult {
                video_id,
                title: snippet_str(snippet, "title"),
                description: snippet_str(snippet, "description"),
                thumbnail: pick_thumbnail(snippet),
                channel_title: snippet_str(snippet, "channelTitle"),
                published_at: snippet_str(snippet, "publishedAt"),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "videos": videos })))
}

// GET /api/youtube/video

#[derive(Debug, Deserialize)]
pub struct VideoParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: String,
    pub duration: u64,
    pub duration_formatted: String,
    pub view_count: String,
    pub like_count: String,
}

pub async fn video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VideoParams>,
) -> Result<Json<VideoSummary>, ApiError> {
    let id = params
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingParameter("id"))?;
    let client = require_key(&state)?;

    let item = client
        .video(id, "snippet,contentDetails,statistics")
        .await?
        .ok_or_else(|| ApiError::VideoNotFound {
            video_id: id.to_string(),
        })?;

    let snippet = item.get("snippet").cloned().unwrap_or_default();
    let iso_duration = item
        .pointer("/contentDetails/duration")
        .and_then(Value::as_str)
        .unwrap_or("");
    let seconds = parse_duration(iso_duration);

    let stat = |field: &str| {
        item.pointer(&format!("/statistics/{field}"))
            .and_then(Value::as_str)
            .unwrap_or("0")
            .to_string()
    };

    Ok(Json(VideoSummary {
        video_id: id.to_string(),
        title: snippet_str(&snippet, "title"),
        description: snippet_str(&snippet, "description"),
        thumbnail: pick_thumbnail(&snippet),
        channel_title: snippet_str(&snippet, "channelTitle"),
        published_at: snippet_str(&snippet, "publishedAt"),
        duration: seconds,
        duration_formatted: format_duration(seconds),
        view_count: stat("viewCount"),
        like_count: stat("likeCount"),
    }))
}
