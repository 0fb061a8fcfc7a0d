mod api;
mod config;
mod error;
mod heuristic;
mod models;
mod pipeline;
mod schema;
mod stages;
mod tools;

use anyhow::Result;
use api::{AppState, Analyzer};
use chrono::Datelike;
use config::{AnalyzerMode, AppConfig};
use heuristic::HeuristicScorer;
use pipeline::ContentPipeline;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("content_analyzer=debug,tower_http=info")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    if config.analyze_secret.is_none() {
        warn!("ANALYZE_SECRET is not set; /analyze will answer 500");
    }

    let analyzer = match config.mode {
        AnalyzerMode::Research => {
            if config.gateway_api_key.is_none() {
                warn!("AI_GATEWAY_API_KEY is not set; /analyze will answer 500");
            }
            if config.tavily_api_key.is_none() {
                warn!("TAVILY_API_KEY is not set; research will run without search results");
            }
            Analyzer::Research(Arc::new(ContentPipeline::from_config(&config)))
        }
        AnalyzerMode::Heuristic => {
            Analyzer::Heuristic(Arc::new(HeuristicScorer::new(chrono::Utc::now().year())))
        }
    };

    let app = api::router(AppState::new(config.clone(), analyzer));

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(
        mode = ?config.mode,
        "Content analyzer running on http://{}",
        config.bind_addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}
