//! Quiz API Routes
//!
//! `GET /quiz` starts a round; `POST /quiz` scores the client's guess
//! against the historical close the session token points at.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use quiz_core::{QuizRound, ScoringResult};
use serde::Deserialize;

use crate::{AppError, AppState};

#[derive(Deserialize)]
pub struct BeginQuery {
    /// Base asset ticker, e.g. "BTC". Omitted or invalid input falls back
    /// to a random allow-list symbol; begin never fails on it.
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub id: String,
    pub guess: f64,
}

pub fn quiz_routes() -> Router<AppState> {
    Router::new().route("/quiz", get(begin_quiz).post(score_quiz))
}

async fn begin_quiz(
    State(state): State<AppState>,
    Query(query): Query<BeginQuery>,
) -> Result<Json<QuizRound>, AppError> {
    let now = Utc::now().timestamp();
    let round = state.orchestrator.begin(query.symbol.as_deref(), now).await?;
    Ok(Json(round))
}

async fn score_quiz(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoringResult>, AppError> {
    let result = state.orchestrator.score(&request.id, request.guess).await?;
    Ok(Json(result))
}
