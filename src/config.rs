// Configuration for the proxy gateway
//
// All upstream credentials are read from the environment exactly once at
// startup. A missing provider key disables that provider's branch; it never
// prevents the server from starting.

use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Origins always allowed to call the gateway, in addition to any
/// `http://localhost:*` origin and the configured frontend URL.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub youtube_api_key: Option<String>,

    /// Origin returned in CORS headers when the request origin is not allowed.
    pub frontend_url: String,

    /// When true, error responses carry a `details` field with the source chain.
    pub development: bool,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Debug details in error responses require an explicit opt-in; an unset
/// NODE_ENV stays locked down.
fn is_development(node_env: Option<&str>) -> bool {
    node_env == Some("development")
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_opt("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: env_opt("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            google_api_key: env_opt("GOOGLE_API_KEY"),
            xai_api_key: env_opt("XAI_API_KEY"),
            youtube_api_key: env_opt("YOUTUBE_API_KEY"),
            frontend_url: env_opt("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            development: is_development(env_opt("NODE_ENV").as_deref()),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Resolve the `Access-Control-Allow-Origin` value for a request origin.
    /// Allow-listed origins and any localhost origin are echoed verbatim;
    /// everything else gets the configured frontend URL.
    pub fn resolve_cors_origin(&self, origin: Option<&str>) -> String {
        if let Some(origin) = origin {
            if ALLOWED_ORIGINS.contains(&origin)
                || origin == self.frontend_url
                || origin.starts_with("http://localhost:")
            {
                return origin.to_string();
            }
        }
        self.frontend_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            frontend_url: "https://notes.example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn cors_echoes_allowed_origin() {
        let config = test_config();
        assert_eq!(
            config.resolve_cors_origin(Some("http://localhost:5173")),
            "http://localhost:5173"
        );
    }

    #[test]
    fn cors_allows_any_localhost_port() {
        let config = test_config();
        assert_eq!(
            config.resolve_cors_origin(Some("http://localhost:4321")),
            "http://localhost:4321"
        );
    }

    #[test]
    fn cors_falls_back_to_frontend_url() {
        let config = test_config();
        assert_eq!(
            config.resolve_cors_origin(Some("https://evil.example.com")),
            "https://notes.example.com"
        );
        assert_eq!(config.resolve_cors_origin(None), "https://notes.example.com");
    }

    #[test]
    fn development_requires_explicit_opt_in() {
        assert!(is_development(Some("development")));
        assert!(!is_development(Some("production")));
        assert!(!is_development(None));
    }

    #[test]
    fn cors_echoes_configured_frontend() {
        let config = test_config();
        assert_eq!(
            config.resolve_cors_origin(Some("https://notes.example.com")),
            "https://notes.example.com"
        );
    }
}
