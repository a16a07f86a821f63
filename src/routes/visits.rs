// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visit and streak routes.

use crate::error::{AppError, Result};
use crate::models::{StreakState, VisitEvent, VisitSource};
use crate::services::visits::{AnswerOutcome, RecordVisitOutcome, VisitSummary};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/visits", post(record_visit))
        .route("/api/answers", post(record_answer))
        .route("/api/streaks/{user_id}", get(get_streak))
        .route("/api/visits/{user_id}/history", get(get_history))
        .route(
            "/api/visits/{user_id}/months/{year}/{month}",
            get(get_month_visits),
        )
        .route("/api/visits/{user_id}/summary", get(get_summary))
}

fn validate_body<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ─── Write Path ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RecordVisitRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[serde(default)]
    pub source: VisitSource,
}

/// Record today's visit. Repeat calls on the same day are no-ops.
async fn record_visit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordVisitRequest>,
) -> Result<Json<RecordVisitOutcome>> {
    validate_body(&body)?;

    let outcome = state
        .ledger
        .record_visit(&body.user_id, today(), body.source)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    pub is_correct: bool,
}

/// Report an answer; a correct one counts as today's activity.
async fn record_answer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordAnswerRequest>,
) -> Result<Json<AnswerOutcome>> {
    validate_body(&body)?;

    let outcome = state
        .ledger
        .record_answer(&body.user_id, body.is_correct, today())
        .await?;
    Ok(Json(outcome))
}

// ─── Reads ───────────────────────────────────────────────────

async fn get_streak(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<StreakState>> {
    Ok(Json(state.ledger.streak(&user_id).await?))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<VisitEvent>>> {
    Ok(Json(state.ledger.history(&user_id, params.limit).await?))
}

async fn get_month_visits(
    State(state): State<Arc<AppState>>,
    Path((user_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<Vec<VisitEvent>>> {
    Ok(Json(
        state.ledger.visits_in_month(&user_id, year, month).await?,
    ))
}

async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<VisitSummary>> {
    Ok(Json(state.ledger.summary(&user_id, today()).await?))
}
