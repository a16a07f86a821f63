// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking engine.
//!
//! Reads streak state in leaderboard order, then enriches every row with
//! ledger-derived facts. Enrichment runs on a bounded pool of spawned tasks
//! that share one deadline per request. Results are gathered in input order,
//! and a failed, panicked or late task only degrades its own entry.

use crate::db::StreakStore;
use crate::error::{AppError, Result};
use crate::models::{Pagination, RankPosition, RankingEntry, RankingPage, StreakState};
use crate::services::visits::validate_user_id;
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Builds ranking pages from the store.
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn StreakStore>,
    concurrency: usize,
    enrichment_timeout: Duration,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn StreakStore>, concurrency: usize, enrichment_timeout: Duration) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
            enrichment_timeout,
        }
    }

    /// One leaderboard page with shared ranks.
    ///
    /// `page` and `per_page` must already be clamped. A page past the end
    /// yields no entries and a valid pagination block.
    pub async fn ranking_page(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
        today: NaiveDate,
    ) -> Result<RankingPage> {
        let total_users = self.store.count_streaks(search).await?;
        let pagination = Pagination::new(page, per_page, total_users);

        let rows = if pagination.page > pagination.total_pages {
            Vec::new()
        } else {
            self.store
                .list_streaks(search, pagination.skip(), per_page as usize)
                .await?
        };

        tracing::debug!(
            page,
            per_page,
            search = ?search,
            total_users,
            rows = rows.len(),
            "Building ranking page"
        );

        let jobs = rows
            .into_iter()
            .map(|state| (state, RankPosition::Shared))
            .collect();
        let entries = self.enrich_all(jobs, today).await;

        Ok(RankingPage {
            entries,
            pagination,
        })
    }

    /// The top `limit` users, ranked by position in the sorted list.
    pub async fn top_streaks(&self, limit: u32, today: NaiveDate) -> Result<Vec<RankingEntry>> {
        let rows = self.store.list_streaks(None, 0, limit as usize).await?;

        let jobs = rows
            .into_iter()
            .enumerate()
            .map(|(index, state)| (state, RankPosition::Positional(index as u64 + 1)))
            .collect();

        Ok(self.enrich_all(jobs, today).await)
    }

    /// A single user's entry with a shared rank.
    ///
    /// Users without a streak record are `NotFound`; a zero streak still resolves.
    pub async fn user_rank(&self, user_id: &str, today: NaiveDate) -> Result<RankingEntry> {
        let user_id = validate_user_id(user_id)?;
        let state = self
            .store
            .get_streak(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No ranking for user {}", user_id)))?;

        let mut entries = self
            .enrich_all(vec![(state.clone(), RankPosition::Shared)], today)
            .await;
        Ok(entries
            .pop()
            .unwrap_or_else(|| fallback_entry(&state, RankPosition::Shared)))
    }

    /// Enrich every row concurrently, preserving input order.
    async fn enrich_all(
        &self,
        jobs: Vec<(StreakState, RankPosition)>,
        today: NaiveDate,
    ) -> Vec<RankingEntry> {
        let deadline = Instant::now() + self.enrichment_timeout;

        stream::iter(jobs)
            .map(|(state, rank)| {
                let engine = self.clone();
                let fallback = fallback_entry(&state, rank);
                let handle = tokio::spawn(async move {
                    engine.enrich_before(state, rank, today, deadline).await
                });

                async move {
                    handle.await.unwrap_or_else(|e| {
                        tracing::warn!(
                            user_id = %fallback.user_id,
                            error = %e,
                            "Enrichment task aborted, degrading entry"
                        );
                        fallback
                    })
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Enrich one row, degrading it on error or when the deadline passes.
    async fn enrich_before(
        &self,
        state: StreakState,
        rank: RankPosition,
        today: NaiveDate,
        deadline: Instant,
    ) -> RankingEntry {
        match tokio::time::timeout_at(deadline, self.enrich(&state, rank, today)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                tracing::warn!(
                    user_id = %state.user_id,
                    error = %e,
                    "Enrichment failed, degrading entry"
                );
                fallback_entry(&state, rank)
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %state.user_id,
                    timeout_ms = self.enrichment_timeout.as_millis() as u64,
                    "Enrichment deadline exceeded, degrading entry"
                );
                fallback_entry(&state, rank)
            }
        }
    }

    async fn enrich(
        &self,
        state: &StreakState,
        rank: RankPosition,
        today: NaiveDate,
    ) -> Result<RankingEntry> {
        let user_id = state.user_id.as_str();

        let (total_visits, last_visit, is_active_today, rank_position) = tokio::try_join!(
            self.store.count_visits(user_id),
            self.store.latest_visit(user_id),
            self.store.has_visit(user_id, today),
            self.rank_position(state, rank),
        )?;

        Ok(RankingEntry {
            user_id: state.user_id.clone(),
            current_streak: state.current_streak,
            longest_streak: state.longest_streak,
            total_visits,
            last_visit_date: last_visit.map(|v| v.visit_date),
            rank_position,
            start_date: state.start_date,
            is_active_today,
        })
    }

    async fn rank_position(&self, state: &StreakState, rank: RankPosition) -> Result<u64> {
        match rank {
            RankPosition::Shared => Ok(self.store.count_streaks_above(state.current_streak).await? + 1),
            RankPosition::Positional(position) => Ok(position),
        }
    }
}

/// Degraded entry; a positional rank is still known without the store.
fn fallback_entry(state: &StreakState, rank: RankPosition) -> RankingEntry {
    let mut entry = RankingEntry::degraded(state);
    if let RankPosition::Positional(position) = rank {
        entry.rank_position = position;
    }
    entry
}
