// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard routes.
//!
//! Query parameters are taken as raw strings so that malformed values fall
//! back to defaults instead of failing extraction.

use crate::error::Result;
use crate::models::{RankingEntry, RankingPage};
use crate::services::query::{top_limit, TopStreaksResponse};
use crate::services::RankingParams;
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ranking", get(get_ranking))
        .route("/api/ranking/top", get(get_top))
        .route("/api/ranking/users/{user_id}", get(get_user_rank))
}

#[derive(Debug, Deserialize)]
struct RankingQueryParams {
    page: Option<String>,
    per_page: Option<String>,
    search: Option<String>,
}

async fn get_ranking(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RankingQueryParams>,
) -> Result<Json<RankingPage>> {
    let params = RankingParams::from_raw(
        raw.page.as_deref(),
        raw.per_page.as_deref(),
        raw.search.as_deref(),
    );

    Ok(Json(state.ranking.page(&params, today()).await?))
}

#[derive(Debug, Deserialize)]
struct TopQueryParams {
    limit: Option<String>,
}

async fn get_top(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<TopQueryParams>,
) -> Result<Json<TopStreaksResponse>> {
    let limit = top_limit(raw.limit.as_deref());
    Ok(Json(state.ranking.top(limit, today()).await?))
}

async fn get_user_rank(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<RankingEntry>> {
    Ok(Json(state.ranking.user(&user_id, today()).await?))
}
