// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrative routes (admin token required, applied in routes/mod.rs).

use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/streaks/{user_id}/reset", post(reset_streak))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResetResponse {
    pub ok: bool,
}

/// Delete a user's streak record. Visit history is kept.
async fn reset_streak(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ResetResponse>> {
    state.ledger.reset(&user_id).await?;
    Ok(Json(ResetResponse { ok: true }))
}
