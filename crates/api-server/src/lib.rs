pub mod quiz_routes;

use std::env;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use binance_client::BinanceClient;
use explain_client::ExplainClient;
use quiz_core::{QuizError, QuizOrchestrator};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state, passed to route handlers via `axum::extract::State`.
///
/// Holds no mutable state: every request is served from the orchestrator's
/// stateless operations plus the client-held session token.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QuizOrchestrator<BinanceClient, ExplainClient>>,
}

impl AppState {
    pub fn from_env() -> Self {
        Self {
            orchestrator: Arc::new(QuizOrchestrator::new(
                BinanceClient::new(),
                ExplainClient::from_env(),
            )),
        }
    }
}

/// Maps the core error taxonomy onto HTTP responses.
#[derive(Debug)]
pub struct AppError(pub QuizError);

impl From<QuizError> for AppError {
    fn from(e: QuizError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            // Upstream feed problems are retryable bad-gateway failures; the
            // error text keeps begin's too-few-candles case distinguishable
            // from a scoring-time fetch failure.
            QuizError::DataUnavailable(_) | QuizError::Upstream(_) => StatusCode::BAD_GATEWAY,
            QuizError::MalformedSession(_) | QuizError::InvalidGuess => StatusCode::BAD_REQUEST,
        };

        let body = json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(quiz_routes::quiz_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let state = AppState::from_env();
    let addr = format!("{}:{}", env_str("QUIZ_BIND", "127.0.0.1"), env_u16("QUIZ_PORT", 8080));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("quiz api listening on {addr}");
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
