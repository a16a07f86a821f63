// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Leaderboard projections. Rebuilt on every query, never persisted.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::StreakState;

/// How an entry's `rank_position` is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankPosition {
    /// Number of users with a strictly greater streak, plus one. Ties share a rank.
    Shared,
    /// 1-based index within an already sorted list. Ties get distinct ranks.
    Positional(u64),
}

/// One leaderboard row: stored streak state plus ledger-derived facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RankingEntry {
    pub user_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_visits: u64,
    pub last_visit_date: Option<NaiveDate>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub rank_position: u64,
    pub start_date: Option<NaiveDate>,
    pub is_active_today: bool,
}

impl RankingEntry {
    /// Entry used when enrichment fails: stored counts survive, derived
    /// fields are zeroed.
    pub fn degraded(state: &StreakState) -> Self {
        Self {
            user_id: state.user_id.clone(),
            current_streak: state.current_streak,
            longest_streak: state.longest_streak,
            total_visits: 0,
            last_visit_date: None,
            rank_position: 0,
            start_date: None,
            is_active_today: false,
        }
    }
}

/// Pagination block returned with every ranking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_users: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total_users: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_users.div_ceil(u64::from(per_page));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        Self {
            page,
            per_page,
            total_pages,
            total_users,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Number of rows to skip before this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// One page of the leaderboard.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RankingPage {
    pub entries: Vec<RankingEntry>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_exact_multiple() {
        let p = Pagination::new(2, 10, 20);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.skip(), 10);
    }

    #[test]
    fn test_pagination_partial_last_page() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_pagination_out_of_range() {
        let p = Pagination::new(9, 5, 12);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.skip(), 40);
    }

    #[test]
    fn test_degraded_keeps_stored_counts() {
        let mut state = StreakState::new("u1", chrono::Utc::now());
        state.current_streak = 4;
        state.longest_streak = 9;
        state.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);

        let entry = RankingEntry::degraded(&state);

        assert_eq!(entry.current_streak, 4);
        assert_eq!(entry.longest_streak, 9);
        assert_eq!(entry.total_visits, 0);
        assert_eq!(entry.rank_position, 0);
        assert_eq!(entry.start_date, None);
        assert!(!entry.is_active_today);
    }
}
