// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Streakboard: daily activity streaks and leaderboards
//!
//! This crate records at most one activity per user per calendar day,
//! derives consecutive-day streaks from that ledger, and serves a ranked,
//! paginated leaderboard over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::StreakStore;
use services::{RankingEngine, RankingQuery, VisitLedger};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn StreakStore>,
    pub ledger: VisitLedger,
    pub ranking: RankingQuery,
}

impl AppState {
    /// Wire services to an opened store.
    pub fn new(config: Config, store: Arc<dyn StreakStore>) -> Self {
        let ledger = VisitLedger::new(store.clone());
        let engine = RankingEngine::new(
            store.clone(),
            config.ranking_concurrency,
            config.enrichment_timeout,
        );

        Self {
            config,
            store,
            ledger,
            ranking: RankingQuery::new(engine),
        }
    }
}
