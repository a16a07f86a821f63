// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin token middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <ADMIN_TOKEN>` for admin routes.
///
/// Admin routes are disabled entirely when no token is configured.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        tracing::warn!("Blocked admin request: ADMIN_TOKEN not configured");
        return Err(AppError::Forbidden);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Blocked admin request with invalid token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
