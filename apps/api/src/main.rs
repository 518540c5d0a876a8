mod config;
mod errors;
mod export;
mod llm_client;
mod roadmap;
mod routes;
mod scrape;
mod state;
mod wizard;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::scrape::{HttpPageFetcher, JobScraper};
use crate::state::AppState;

// Base64 resume payloads arrive inline in the JSON body.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Astrolabe API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini_base_url.clone(), config.gemini_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize job-posting scraper
    let scraper = JobScraper::new(
        Arc::new(HttpPageFetcher::new()),
        config.reader_proxy_url.clone(),
        config.scrape_max_chars,
    );
    info!(
        "Job scraper initialized (reader proxy: {})",
        config.reader_proxy_url
    );

    // Build app state
    let state = AppState { llm, scraper };

    // Build router
    let app = build_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
