// Best-effort website scraper.
//
// Extraction is plain regex over the raw HTML, isolated in
// `extract_page_summary` so it can be exercised without network I/O. This is
// a known-lossy approach: malformed or nested markup may leak fragments into
// the text. Good enough for feeding page text to a model, which is all the
// frontend does with it.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Body text is capped at this many characters, with a trailing ellipsis.
const MAX_CONTENT_CHARS: usize = 5000;
/// Anything shorter than this after extraction is treated as no content.
const MIN_CONTENT_CHARS: usize = 50;

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static META_DESC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta[^>]*name=["']description["'][^>]*content=["']([^"']*)["']"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    pub description: Option<String>,
    pub text: String,
}

/// Pull title, meta description, and tag-stripped body text out of raw HTML.
pub fn extract_page_summary(html: &str) -> PageSummary {
    let title = TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| WS_RE.replace_all(m.as_str().trim(), " ").to_string())
        .unwrap_or_default();

    let description = META_DESC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|d| !d.is_empty());

    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_styles = STYLE_RE.replace_all(&without_scripts, " ");
    let without_tags = TAG_RE.replace_all(&without_styles, " ");
    let text = WS_RE.replace_all(&without_tags, " ").trim().to_string();

    PageSummary {
        title,
        description,
        text,
    }
}

/// Truncate body text to the cap, appending an ellipsis iff it was longer.
fn truncate_body(text: &str) -> String {
    if text.chars().count() > MAX_CONTENT_CHARS {
        let mut truncated: String = text.chars().take(MAX_CONTENT_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub description: String,
}

// GET /api/scrape
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
) -> Result<Json<ScrapeResult>, ApiError> {
    let url = params
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::MissingParameter("url"))?;

    tracing::info!(url, "scraping page");
    let response = state
        .http
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to fetch URL: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::ScrapeFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to read page body: {e}")))?;

    let summary = extract_page_summary(&html);
    let body = truncate_body(&summary.text);
    let content = match &summary.description {
        Some(description) => format!("{description}\n\n{body}"),
        None => body,
    };

    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(ApiError::NoMeaningfulContent {
            url: url.to_string(),
        });
    }

    Ok(Json(ScrapeResult {
        url: url.to_string(),
        title: summary.title,
        content,
        description: summary.description.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_styles_and_tags() {
        let html = r#"<html><head>
            <title>My Page</title>
            <style>body { color: red; }</style>
            <script type="text/javascript">alert("x");</script>
        </head><body><p>Hello <b>world</b></p></body></html>"#;
        let summary = extract_page_summary(html);
        assert_eq!(summary.title, "My Page");
        assert_eq!(summary.text, "My Page Hello world");
        assert!(!summary.text.contains("alert"));
        assert!(!summary.text.contains("color"));
    }

    #[test]
    fn script_stripping_is_case_insensitive_and_multiline() {
        let html = "<SCRIPT>\nvar a = 1;\nvar b = 2;\n</SCRIPT>plain text here";
        let summary = extract_page_summary(html);
        assert_eq!(summary.text, "plain text here");
    }

    #[test]
    fn extracts_meta_description() {
        let html = r#"<meta name="description" content="A test page"><p>body</p>"#;
        let summary = extract_page_summary(html);
        assert_eq!(summary.description.as_deref(), Some("A test page"));
    }

    #[test]
    fn missing_title_and_description_are_empty() {
        let summary = extract_page_summary("<p>just text</p>");
        assert_eq!(summary.title, "");
        assert_eq!(summary.description, None);
        assert_eq!(summary.text, "just text");
    }

    #[test]
    fn collapses_whitespace() {
        let summary = extract_page_summary("<p>a\n\n   b\t\tc</p>");
        assert_eq!(summary.text, "a b c");
    }

    #[test]
    fn truncates_long_bodies_with_ellipsis() {
        let long = "x".repeat(MAX_CONTENT_CHARS + 100);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn short_bodies_are_untouched() {
        let exact = "y".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_body(&exact), exact);
        assert_eq!(truncate_body("short"), "short");
    }
}
