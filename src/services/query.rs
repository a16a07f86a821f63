// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ranking query façade.
//!
//! Callers get a permissive contract: malformed or out-of-range pagination
//! input is coerced to the nearest valid value instead of being rejected.

use crate::error::Result;
use crate::models::{RankingEntry, RankingPage};
use crate::services::RankingEngine;
use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_TOP_LIMIT: u32 = 10;
pub const MAX_TOP_LIMIT: u32 = 50;
pub const MAX_SEARCH_LEN: usize = 100;

/// Validated parameters for a ranking page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingParams {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

impl RankingParams {
    /// Coerce raw query-string values into valid parameters.
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>, search: Option<&str>) -> Self {
        Self {
            page: clamp_param(page, 1, 1, u32::MAX),
            per_page: clamp_param(per_page, DEFAULT_PER_PAGE, 1, MAX_PER_PAGE),
            search: normalize_search(search),
        }
    }
}

impl Default for RankingParams {
    fn default() -> Self {
        Self::from_raw(None, None, None)
    }
}

/// Clamp a top-N limit into `[1, MAX_TOP_LIMIT]`, defaulting when absent or malformed.
pub fn top_limit(raw: Option<&str>) -> u32 {
    clamp_param(raw, DEFAULT_TOP_LIMIT, 1, MAX_TOP_LIMIT)
}

/// Parse an integer parameter; malformed input falls back to `default`,
/// numeric input is clamped into `[min, max]`.
fn clamp_param(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    match raw.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
        Some(value) => value.clamp(i64::from(min), i64::from(max)) as u32,
        None => default,
    }
}

fn normalize_search(raw: Option<&str>) -> Option<String> {
    let term = raw?.trim();
    if term.is_empty() {
        return None;
    }
    Some(term.chars().take(MAX_SEARCH_LEN).collect())
}

/// Response for the top-N leaderboard.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TopStreaksResponse {
    pub entries: Vec<RankingEntry>,
}

/// Entry point for ranking reads from the HTTP boundary.
#[derive(Clone)]
pub struct RankingQuery {
    engine: RankingEngine,
}

impl RankingQuery {
    pub fn new(engine: RankingEngine) -> Self {
        Self { engine }
    }

    pub async fn page(&self, params: &RankingParams, today: NaiveDate) -> Result<RankingPage> {
        self.engine
            .ranking_page(params.page, params.per_page, params.search.as_deref(), today)
            .await
    }

    pub async fn top(&self, limit: u32, today: NaiveDate) -> Result<TopStreaksResponse> {
        let limit = limit.clamp(1, MAX_TOP_LIMIT);
        let entries = self.engine.top_streaks(limit, today).await?;
        Ok(TopStreaksResponse { entries })
    }

    pub async fn user(&self, user_id: &str, today: NaiveDate) -> Result<RankingEntry> {
        self.engine.user_rank(user_id, today).await
    }
}
