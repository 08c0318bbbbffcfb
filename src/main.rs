use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memogate::api::{self, AppState};
use memogate::config::Config;
use memogate::error;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("memogate=info,tower_http=debug")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    error::set_dev_mode(config.development);

    for (name, key) in [
        ("OpenAI", &config.openai_api_key),
        ("Anthropic", &config.anthropic_api_key),
        ("Google", &config.google_api_key),
        ("xAI", &config.xai_api_key),
        ("YouTube", &config.youtube_api_key),
    ] {
        if key.is_none() {
            tracing::warn!("{} API key not set; that provider is disabled", name);
        }
    }

    let addr = config.bind_addr()?;
    let state = Arc::new(AppState::new(config));
    let app = api::router(state);

    tracing::info!("memogate listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
