use crate::config::{AnalyzerMode, AppConfig};
use crate::error::{AnalyzeError, Result};
use crate::heuristic::HeuristicScorer;
use crate::models::{AnalysisRequest, AnalysisResponse, HeuristicRequest};
use crate::pipeline::ContentPipeline;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

/// The two deployment variants of `POST /analyze`.
#[derive(Clone)]
pub enum Analyzer {
    Research(Arc<ContentPipeline>),
    Heuristic(Arc<HeuristicScorer>),
}

impl Analyzer {
    fn mode(&self) -> AnalyzerMode {
        match self {
            Analyzer::Research(_) => AnalyzerMode::Research,
            Analyzer::Heuristic(_) => AnalyzerMode::Heuristic,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    analyzer: Analyzer,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, analyzer: Analyzer) -> Self {
        Self { config, analyzer }
    }
}

#[derive(Debug, Deserialize)]
struct AuthQuery {
    secret: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let app = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Configuration is checked before the credential so a missing secret is
/// reported as a server fault, not compared against.
fn authorize(config: &AppConfig, mode: AnalyzerMode, provided: Option<&str>) -> Result<()> {
    if mode == AnalyzerMode::Research && config.gateway_api_key.is_none() {
        return Err(AnalyzeError::ConfigurationMissing("AI_GATEWAY_API_KEY"));
    }
    let expected = config
        .analyze_secret
        .as_deref()
        .ok_or(AnalyzeError::ConfigurationMissing("ANALYZE_SECRET"))?;

    match provided {
        Some(secret) if secrets_match(secret, expected) => Ok(()),
        _ => Err(AnalyzeError::Unauthorized),
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn secrets_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn parse_body<T: serde::de::DeserializeOwned>(
    body: std::result::Result<Json<Value>, JsonRejection>,
    expected: &str,
) -> Result<T> {
    let Json(value) = body
        .map_err(|_| AnalyzeError::InvalidInput("Request body must be valid JSON".to_string()))?;
    serde_json::from_value(value).map_err(|_| AnalyzeError::InvalidInput(expected.to_string()))
}

async fn analyze(
    State(state): State<AppState>,
    auth: std::result::Result<Query<AuthQuery>, QueryRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisResponse>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", request_id = %request_id);

    async move {
        let start_time = std::time::Instant::now();
        // An unparsable query string carries no usable credential.
        let secret = auth.ok().and_then(|Query(q)| q.secret);
        authorize(&state.config, state.analyzer.mode(), secret.as_deref())?;

        let response = match &state.analyzer {
            Analyzer::Research(pipeline) => {
                let req: AnalysisRequest = parse_body(body, "`content` must be a string")?;
                let content = req.content.trim();
                if content.is_empty() {
                    return Err(AnalyzeError::InvalidInput("`content` must not be empty".to_string()));
                }
                pipeline.analyze(content).await?
            }
            Analyzer::Heuristic(scorer) => {
                let req: HeuristicRequest =
                    parse_body(body, "`fields` must be an object of strings")?;
                scorer.score(&req.fields)?
            }
        };

        info!(
            score = response.content_score,
            suggestions = response.suggestions.len(),
            "Analysis completed in {:?}",
            start_time.elapsed()
        );
        Ok::<_, AnalyzeError>(Json(response))
    }
    .instrument(span)
    .await
}
