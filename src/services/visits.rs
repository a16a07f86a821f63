// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visit ledger service.
//!
//! Handles the write path:
//! 1. Insert the day's visit (create-only, at most one per user per day)
//! 2. If the day is new, apply the streak transition atomically
//!
//! Repeat calls on the same day are no-ops and never recompute the streak.
//! Store failures on this path are propagated, never swallowed.

use crate::db::StreakStore;
use crate::error::{AppError, Result};
use crate::models::{StreakState, VisitEvent, VisitSource};
use crate::time_utils::{month_bounds, month_key};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted user ID.
pub const MAX_USER_ID_LEN: usize = 128;
/// Visit history entries returned when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 30;
/// Upper bound for the visit history limit.
pub const MAX_HISTORY_LIMIT: usize = 365;

/// Result of recording a visit.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordVisitOutcome {
    /// The day was already recorded; nothing changed
    pub already_recorded: bool,
    /// Streak state after the call (absent if reset after today's visit)
    pub streak: Option<StreakState>,
}

/// Result of reporting an answer.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AnswerOutcome {
    /// Whether the answer counted as the day's activity
    pub counted: bool,
    pub already_recorded: bool,
    pub streak: Option<StreakState>,
}

/// Per-user visit statistics.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VisitSummary {
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_visits: u64,
    pub visited_today: bool,
    pub last_visit_date: Option<NaiveDate>,
    /// Visit count per month ("YYYY-MM")
    pub monthly: BTreeMap<String, u32>,
}

/// Validate and normalize a user ID.
pub fn validate_user_id(raw: &str) -> Result<&str> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }
    if user_id.chars().count() > MAX_USER_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "user_id must be at most {} characters",
            MAX_USER_ID_LEN
        )));
    }
    Ok(user_id)
}

/// Records daily activity and keeps streak state in step with the ledger.
#[derive(Clone)]
pub struct VisitLedger {
    store: Arc<dyn StreakStore>,
}

impl VisitLedger {
    pub fn new(store: Arc<dyn StreakStore>) -> Self {
        Self { store }
    }

    /// Record that `user_id` was active on `today`.
    pub async fn record_visit(
        &self,
        user_id: &str,
        today: NaiveDate,
        source: VisitSource,
    ) -> Result<RecordVisitOutcome> {
        let user_id = validate_user_id(user_id)?;
        let visit = VisitEvent::new(user_id, today, source);

        let recorded = self
            .store
            .record_visit(&visit, Utc::now())
            .await
            .inspect_err(|e| {
                tracing::error!(user_id, visit_date = %today, error = %e, "Failed to record visit");
            })?;

        let Some(streak) = recorded else {
            tracing::debug!(user_id, visit_date = %today, "Visit already recorded today");
            return Ok(RecordVisitOutcome {
                already_recorded: true,
                streak: self.store.get_streak(user_id).await?,
            });
        };

        tracing::info!(
            user_id,
            visit_date = %today,
            %source,
            current_streak = streak.current_streak,
            longest_streak = streak.longest_streak,
            "Visit recorded"
        );

        Ok(RecordVisitOutcome {
            already_recorded: false,
            streak: Some(streak),
        })
    }

    /// A correct answer counts as the day's activity; an incorrect one does not.
    pub async fn record_answer(
        &self,
        user_id: &str,
        is_correct: bool,
        today: NaiveDate,
    ) -> Result<AnswerOutcome> {
        if is_correct {
            let outcome = self
                .record_visit(user_id, today, VisitSource::CorrectAnswer)
                .await?;
            return Ok(AnswerOutcome {
                counted: true,
                already_recorded: outcome.already_recorded,
                streak: outcome.streak,
            });
        }

        let user_id = validate_user_id(user_id)?;
        Ok(AnswerOutcome {
            counted: false,
            already_recorded: self.store.has_visit(user_id, today).await?,
            streak: self.store.get_streak(user_id).await?,
        })
    }

    /// Current streak state for a user.
    pub async fn streak(&self, user_id: &str) -> Result<StreakState> {
        let user_id = validate_user_id(user_id)?;
        self.store
            .get_streak(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No streak for user {}", user_id)))
    }

    /// Forget the streak counter; the ledger is kept.
    ///
    /// Returns `true` if a record was deleted.
    pub async fn reset(&self, user_id: &str) -> Result<bool> {
        let user_id = validate_user_id(user_id)?;
        let deleted = self.store.delete_streak(user_id).await?;
        tracing::info!(user_id, deleted, "Streak reset");
        Ok(deleted)
    }

    /// Most recent visits, newest first.
    pub async fn history(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<VisitEvent>> {
        let user_id = validate_user_id(user_id)?;
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.store
            .list_visits(user_id, None, None, Some(limit))
            .await
    }

    /// Visits within one calendar month, newest first.
    pub async fn visits_in_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<VisitEvent>> {
        let user_id = validate_user_id(user_id)?;
        let (start, end) = month_bounds(year, month).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid month: {}-{}", year, month))
        })?;
        self.store
            .list_visits(user_id, Some(start), Some(end), None)
            .await
    }

    /// Totals and per-month counts for a user.
    pub async fn summary(&self, user_id: &str, today: NaiveDate) -> Result<VisitSummary> {
        let user_id = validate_user_id(user_id)?;
        let visits = self.store.list_visits(user_id, None, None, None).await?;

        let mut monthly = BTreeMap::new();
        for visit in &visits {
            *monthly.entry(month_key(visit.visit_date)).or_insert(0) += 1;
        }

        Ok(VisitSummary {
            user_id: user_id.to_string(),
            total_visits: visits.len() as u64,
            visited_today: visits.iter().any(|v| v.visit_date == today),
            last_visit_date: visits.first().map(|v| v.visit_date),
            monthly,
        })
    }
}
