// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer.
//!
//! Services depend on the [`StreakStore`] trait, not on a concrete backend.
//! The handle is opened once at startup and passed explicitly into each
//! service; [`StreakStore::close`] is called on shutdown.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, Result};
use crate::models::{StreakState, VisitEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    /// Visit ledger, one document per user per day
    pub const VISITS: &str = "visits";
    /// Streak state, keyed by user_id
    pub const USER_STREAKS: &str = "user_streaks";
}

/// Open the configured store backend.
pub async fn open(config: &Config) -> Result<Arc<dyn StreakStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore => {
            let project_id = config.gcp_project_id.as_deref().ok_or_else(|| {
                AppError::Database("GCP_PROJECT_ID is required for Firestore".to_string())
            })?;
            Ok(Arc::new(FirestoreStore::new(project_id).await?))
        }
    }
}

/// Case-insensitive substring match on `user_id`.
pub(crate) fn matches_search(user_id: &str, search: Option<&str>) -> bool {
    match search {
        Some(term) => user_id.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

/// Leaderboard order: longest current streak first, then `user_id` ascending.
pub fn ranking_order(a: &StreakState, b: &StreakState) -> std::cmp::Ordering {
    b.current_streak
        .cmp(&a.current_streak)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Document store holding the visit ledger and per-user streak state.
#[async_trait]
pub trait StreakStore: Send + Sync {
    // ─── Visit Ledger ────────────────────────────────────────────

    /// Insert a visit and apply it to the user's streak as one atomic write.
    ///
    /// Returns the resulting streak state, or `None` when a visit already
    /// exists for the same user and day (nothing is written). Either both
    /// the ledger row and the streak update land, or neither does.
    /// Concurrent callers for the same `(user_id, visit_date)` see exactly
    /// one `Some`.
    async fn record_visit(
        &self,
        visit: &VisitEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<StreakState>>;

    /// Insert a ledger row only, leaving streak state untouched.
    ///
    /// Returns `true` if the visit was inserted, `false` for a duplicate.
    /// Used for imports and fixtures.
    async fn insert_visit(&self, visit: &VisitEvent) -> Result<bool>;

    /// Whether a visit exists for the user on the given day.
    async fn has_visit(&self, user_id: &str, visit_date: NaiveDate) -> Result<bool>;

    /// Number of visits recorded for a user.
    async fn count_visits(&self, user_id: &str) -> Result<u64>;

    /// Most recent visit for a user.
    async fn latest_visit(&self, user_id: &str) -> Result<Option<VisitEvent>>;

    /// Visits for a user in `[start, end)`, newest first.
    ///
    /// `None` bounds are open. At most `limit` visits are returned.
    async fn list_visits(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<VisitEvent>>;

    // ─── Streak State ────────────────────────────────────────────

    /// Get the streak record for a user.
    async fn get_streak(&self, user_id: &str) -> Result<Option<StreakState>>;

    /// Delete the streak record. Returns `true` if a record existed.
    async fn delete_streak(&self, user_id: &str) -> Result<bool>;

    /// Number of streak records whose `user_id` matches `search`.
    async fn count_streaks(&self, search: Option<&str>) -> Result<u64>;

    /// Streak records in leaderboard order, filtered by `search`.
    async fn list_streaks(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: usize,
    ) -> Result<Vec<StreakState>>;

    /// Number of users whose current streak is strictly greater than `streak`.
    async fn count_streaks_above(&self, streak: u32) -> Result<u64>;

    /// Release backend resources. Called once at shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
