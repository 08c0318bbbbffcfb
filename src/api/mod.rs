// HTTP surface of the gateway: state, routes, CORS.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub mod claude;
pub mod gemini;
pub mod handlers;
pub mod model_router;
pub mod openai;
pub mod scrape;
pub mod transcript;
pub mod youtube;

/// Shared immutable state: configuration plus one reqwest client reused for
/// every outbound call.
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// CORS layer. tower-http's `CorsLayer` cannot express "echo allow-listed
/// origins, otherwise answer with a fixed default", so this is a plain
/// middleware. Preflight requests are answered 204 without hitting a handler.
async fn cors_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allow_origin = state.config.resolve_cors_origin(origin.as_deref());

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));

    response
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/ai/invoke", post(handlers::invoke))
        .route("/api/youtube/search", get(youtube::search))
        .route("/api/youtube/video", get(youtube::video))
        .route("/api/youtube/transcript", get(transcript::transcript))
        .route("/api/scrape", get(scrape::scrape))
        .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config = Config {
            frontend_url: "https://notes.example.com".to_string(),
            ..Default::default()
        };
        router(Arc::new(AppState::new(config)))
    }

    #[tokio::test]
    async fn preflight_options_answers_204() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/ai/invoke")
            .header(header::ORIGIN, "http://localhost:4000")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:4000"
        );
    }

    #[tokio::test]
    async fn disallowed_origin_gets_the_default() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://notes.example.com"
        );
    }
}
