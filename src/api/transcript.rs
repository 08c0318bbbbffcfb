// Transcript resolver: caption tracks first, video description as fallback.
//
// Captions come from YouTube's public timedtext surface: list the available
// tracks, fetch the first one (preferring English) as XML, and flatten the
// cue texts. When no captions exist and a Data API key is configured, a
// sufficiently long video description is served instead, clearly flagged.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::youtube::YouTubeClient;
use super::AppState;
use crate::error::ApiError;

const TIMEDTEXT_BASE: &str = "https://video.google.com/timedtext";

/// Description shorter than this is not worth substituting for a transcript.
const MIN_FALLBACK_DESCRIPTION: usize = 100;
/// Fallback transcripts are capped to keep responses bounded.
const MAX_FALLBACK_CHARS: usize = 2000;

static TRACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<track[^>]*lang_code="([^"]+)""#).unwrap());
static CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([\d.]+)"(?: dur="([\d.]+)")?[^>]*>(.*?)</text>"#).unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Decode the handful of entities timedtext XML emits.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

/// Parse a timedtext transcript document into segments.
fn parse_cues(xml: &str) -> Vec<CaptionSegment> {
    CUE_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let raw = caps.get(3)?.as_str();
            let text = decode_entities(&TAG_RE.replace_all(raw, " "));
            let text = WS_RE.replace_all(&text, " ").trim().to_string();
            Some(CaptionSegment {
                text,
                start: caps.get(1)?.as_str().parse().ok()?,
                duration: caps
                    .get(2)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0.0),
            })
        })
        .collect()
}

/// Pick a caption track language from the track list, preferring English.
fn pick_track_lang(track_list_xml: &str) -> Option<String> {
    let langs: Vec<String> = TRACK_RE
        .captures_iter(track_list_xml)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    langs
        .iter()
        .find(|l| l.starts_with("en"))
        .or_else(|| langs.first())
        .cloned()
}

/// Flatten segment texts into one whitespace-normalized transcript string.
fn join_segments(segments: &[CaptionSegment]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    WS_RE.replace_all(&joined, " ").trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

async fn fetch_captions(
    http: &reqwest::Client,
    video_id: &str,
) -> Result<Vec<CaptionSegment>, anyhow::Error> {
    let track_list = http
        .get(TIMEDTEXT_BASE)
        .query(&[("type", "list"), ("v", video_id)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let lang = pick_track_lang(&track_list)
        .ok_or_else(|| anyhow::anyhow!("No caption tracks available for this video"))?;

    let transcript_xml = http
        .get(TIMEDTEXT_BASE)
        .query(&[("lang", lang.as_str()), ("v", video_id)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(parse_cues(&transcript_xml))
}

/// Attempt the description fallback. Returns `None` when no Data API key is
/// configured, the lookup fails, or the description is too short to be useful.
async fn description_fallback(state: &AppState, video_id: &str) -> Option<String> {
    let api_key = state.config.youtube_api_key.clone()?;
    let client = YouTubeClient::new(state.http.clone(), api_key);

    let item = client.video(video_id, "snippet").await.ok()??;
    let description = item
        .pointer("/snippet/description")
        .and_then(Value::as_str)?;
    if description.chars().count() > MIN_FALLBACK_DESCRIPTION {
        Some(truncate_chars(description, MAX_FALLBACK_CHARS))
    } else {
        None
    }
}

/// Outcome of the primary caption fetch. Only `Failed` is eligible for the
/// description fallback; tracks that exist but carry no text are a terminal
/// not-found, never substituted.
#[derive(Debug)]
enum CaptionOutcome {
    Transcript {
        text: String,
        segments: Vec<CaptionSegment>,
    },
    EmptyTracks,
    Failed(String),
}

fn evaluate_captions(result: Result<Vec<CaptionSegment>, anyhow::Error>) -> CaptionOutcome {
    match result {
        Ok(segments) => {
            let text = join_segments(&segments);
            if text.is_empty() {
                CaptionOutcome::EmptyTracks
            } else {
                CaptionOutcome::Transcript { text, segments }
            }
        }
        Err(e) => CaptionOutcome::Failed(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptParams {
    pub id: Option<String>,
}

// GET /api/youtube/transcript
pub async fn transcript(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TranscriptParams>,
) -> Result<Json<Value>, ApiError> {
    let id = params
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingParameter("id"))?;

    let caption_error = match evaluate_captions(fetch_captions(&state.http, id).await) {
        CaptionOutcome::Transcript { text, segments } => {
            return Ok(Json(json!({
                "transcript": text,
                "segments": segments,
                "videoId": id,
            })));
        }
        CaptionOutcome::EmptyTracks => {
            return Err(ApiError::TranscriptUnavailable {
                video_id: id.to_string(),
                reason: "Caption track contained no text".to_string(),
                suggestion: Some(
                    "This video may not have captions. Try a video with subtitles enabled."
                        .to_string(),
                ),
            });
        }
        CaptionOutcome::Failed(reason) => {
            tracing::warn!(video_id = id, error = %reason, "caption fetch failed, trying description fallback");
            reason
        }
    };

    if let Some(description) = description_fallback(&state, id).await {
        return Ok(Json(json!({
            "transcript": description,
            "fallback": true,
            "message": "Captions unavailable; showing the video description instead.",
            "videoId": id,
        })));
    }

    Err(ApiError::TranscriptUnavailable {
        video_id: id.to_string(),
        reason: caption_error,
        suggestion: Some(
            "This video may not have captions. Try a video with subtitles enabled.".to_string(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_LIST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript_list>
  <track id="0" name="" lang_code="de" lang_original="Deutsch"/>
  <track id="1" name="" lang_code="en" lang_original="English"/>
</transcript_list>"#;

    const TRANSCRIPT_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.4" dur="2.1">Hello &amp; welcome</text>
  <text start="2.5" dur="1.8">to the  <i>show</i></text>
  <text start="4.3">final cue</text>
</transcript>"#;

    #[test]
    fn prefers_english_track() {
        assert_eq!(pick_track_lang(TRACK_LIST).as_deref(), Some("en"));
    }

    #[test]
    fn falls_back_to_first_track() {
        let only_de = r#"<transcript_list><track lang_code="de"/></transcript_list>"#;
        assert_eq!(pick_track_lang(only_de).as_deref(), Some("de"));
        assert_eq!(pick_track_lang("<transcript_list/>"), None);
    }

    #[test]
    fn parses_cues_and_decodes_entities() {
        let cues = parse_cues(TRANSCRIPT_XML);
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].text, "Hello & welcome");
        assert_eq!(cues[0].start, 0.4);
        assert_eq!(cues[0].duration, 2.1);
        assert_eq!(cues[1].text, "to the show");
        assert_eq!(cues[2].duration, 0.0);
    }

    #[test]
    fn joins_segments_with_collapsed_whitespace() {
        let cues = parse_cues(TRANSCRIPT_XML);
        assert_eq!(join_segments(&cues), "Hello & welcome to the show final cue");
    }

    #[test]
    fn empty_cues_join_to_empty_string() {
        let cues = parse_cues(r#"<transcript><text start="0" dur="1"> </text></transcript>"#);
        assert_eq!(join_segments(&cues), "");
    }

    #[test]
    fn empty_caption_tracks_are_terminal_not_fallback_eligible() {
        // Tracks listed but every cue blank: must classify as EmptyTracks,
        // which the handler turns into 404 without trying the description.
        let cues = parse_cues(r#"<transcript><text start="0" dur="1"> </text></transcript>"#);
        assert!(matches!(
            evaluate_captions(Ok(cues)),
            CaptionOutcome::EmptyTracks
        ));
        assert!(matches!(
            evaluate_captions(Ok(Vec::new())),
            CaptionOutcome::EmptyTracks
        ));
    }

    #[test]
    fn only_fetch_failures_are_fallback_eligible() {
        let outcome = evaluate_captions(Err(anyhow::anyhow!("no captions")));
        match outcome {
            CaptionOutcome::Failed(reason) => assert_eq!(reason, "no captions"),
            other => panic!("expected Failed, got {other:?}"),
        }

        let cues = parse_cues(TRANSCRIPT_XML);
        assert!(matches!(
            evaluate_captions(Ok(cues)),
            CaptionOutcome::Transcript { .. }
        ));
    }

    #[test]
    fn truncates_by_characters() {
        let long = "é".repeat(3000);
        assert_eq!(truncate_chars(&long, MAX_FALLBACK_CHARS).chars().count(), 2000);
        assert_eq!(truncate_chars("short", MAX_FALLBACK_CHARS), "short");
    }
}
