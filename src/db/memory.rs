// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by `DashMap`.
//!
//! Each map entry is guarded by its shard lock, so updates through
//! `DashMap::entry` are atomic per key. No lock is ever held across an
//! `.await`.

use crate::db::{matches_search, ranking_order, StreakStore};
use crate::error::Result;
use crate::models::{StreakState, VisitEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// In-memory store: per-user visit ledgers and streak records.
#[derive(Default)]
pub struct MemoryStore {
    /// user_id -> (visit_date -> visit)
    visits: DashMap<String, BTreeMap<NaiveDate, VisitEvent>>,
    /// user_id -> streak state
    streaks: DashMap<String, StreakState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a streak record as-is, bypassing the transition rules.
    ///
    /// Used to seed fixtures and for administrative imports.
    pub fn put_streak(&self, state: StreakState) {
        self.streaks.insert(state.user_id.clone(), state);
    }
}

#[async_trait]
impl StreakStore for MemoryStore {
    async fn record_visit(
        &self,
        visit: &VisitEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<StreakState>> {
        // The ledger entry stays locked until the streak is updated. Lock
        // order is always visits, then streaks.
        let mut ledger = self.visits.entry(visit.user_id.clone()).or_default();
        let Entry::Vacant(slot) = ledger.entry(visit.visit_date) else {
            return Ok(None);
        };

        let updated = {
            let mut state = self
                .streaks
                .entry(visit.user_id.clone())
                .or_insert_with(|| StreakState::new(&visit.user_id, now));
            state.apply_visit(visit.visit_date, now);
            state.clone()
        };
        slot.insert(visit.clone());

        Ok(Some(updated))
    }

    async fn insert_visit(&self, visit: &VisitEvent) -> Result<bool> {
        let mut ledger = self.visits.entry(visit.user_id.clone()).or_default();
        match ledger.entry(visit.visit_date) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(visit.clone());
                Ok(true)
            }
        }
    }

    async fn has_visit(&self, user_id: &str, visit_date: NaiveDate) -> Result<bool> {
        Ok(self
            .visits
            .get(user_id)
            .is_some_and(|ledger| ledger.contains_key(&visit_date)))
    }

    async fn count_visits(&self, user_id: &str) -> Result<u64> {
        Ok(self
            .visits
            .get(user_id)
            .map(|ledger| ledger.len() as u64)
            .unwrap_or(0))
    }

    async fn latest_visit(&self, user_id: &str) -> Result<Option<VisitEvent>> {
        Ok(self
            .visits
            .get(user_id)
            .and_then(|ledger| ledger.values().next_back().cloned()))
    }

    async fn list_visits(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<VisitEvent>> {
        let Some(ledger) = self.visits.get(user_id) else {
            return Ok(Vec::new());
        };

        Ok(ledger
            .values()
            .rev()
            .filter(|v| start.map_or(true, |s| v.visit_date >= s))
            .filter(|v| end.map_or(true, |e| v.visit_date < e))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_streak(&self, user_id: &str) -> Result<Option<StreakState>> {
        Ok(self.streaks.get(user_id).map(|s| s.clone()))
    }

    async fn delete_streak(&self, user_id: &str) -> Result<bool> {
        Ok(self.streaks.remove(user_id).is_some())
    }

    async fn count_streaks(&self, search: Option<&str>) -> Result<u64> {
        Ok(self
            .streaks
            .iter()
            .filter(|s| matches_search(&s.user_id, search))
            .count() as u64)
    }

    async fn list_streaks(
        &self,
        search: Option<&str>,
        skip: u64,
        limit: usize,
    ) -> Result<Vec<StreakState>> {
        let mut rows: Vec<StreakState> = self
            .streaks
            .iter()
            .filter(|s| matches_search(&s.user_id, search))
            .map(|s| s.value().clone())
            .collect();
        rows.sort_by(ranking_order);

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(limit).collect())
    }

    async fn count_streaks_above(&self, streak: u32) -> Result<u64> {
        Ok(self
            .streaks
            .iter()
            .filter(|s| s.current_streak > streak)
            .count() as u64)
    }
}
