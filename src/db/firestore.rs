// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed store.
//!
//! Collections:
//! - `visits`: one document per user per day, ID `{user_id}_{YYYY-MM-DD}`
//! - `user_streaks`: one document per user, ID `{user_id}`
//!
//! Unsearched ranking queries page and count on the server. Firestore has no
//! substring operator, so searched queries filter the ordered `user_streaks`
//! collection in memory.

use crate::db::{collections, matches_search, ranking_order, StreakStore};
use crate::error::{AppError, Result};
use crate::models::visit::visit_document_id;
use crate::models::{StreakState, StreakTransition, VisitEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{FirestoreQueryDirection, FirestoreWritePrecondition};
use futures_util::FutureExt;
use serde::Deserialize;

/// Result row of a `COUNT` aggregation.
#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

fn db_error(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

fn streak_document_id(user_id: &str) -> String {
    urlencoding::encode(user_id).into_owned()
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// All visits for a user, newest first.
    async fn user_visits(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<VisitEvent>> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::VISITS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("visit_date", FirestoreQueryDirection::Descending)]);

        let query = match limit {
            Some(limit) => query.limit(limit),
            None => query,
        };

        query.obj().query().await.map_err(db_error)
    }

    /// Every streak document in leaderboard order.
    async fn all_streaks(&self) -> Result<Vec<StreakState>> {
        let mut rows: Vec<StreakState> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_STREAKS)
            .order_by([("current_streak", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        rows.sort_by(ranking_order);
        Ok(rows)
    }
}

#[async_trait]
impl StreakStore for FirestoreStore {
    // ─── Visit Ledger ────────────────────────────────────────────

    /// Write the visit and the streak update in one Firestore transaction.
    ///
    /// Both reads go through the transaction-bound client, so a concurrent
    /// write to either document (a same-day visit, a reset) fails the commit
    /// and the closure is retried against fresh data.
    async fn record_visit(
        &self,
        visit: &VisitEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<StreakState>> {
        let visit_id = visit.document_id();
        let streak_id = streak_document_id(&visit.user_id);

        let recorded: Option<(StreakState, StreakTransition)> = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let visit = visit.clone();
                let visit_id = visit_id.clone();
                let streak_id = streak_id.clone();

                async move {
                    // 1. Idempotency: one visit per user per day
                    let existing: Option<VisitEvent> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::VISITS)
                        .obj()
                        .one(&visit_id)
                        .await?;
                    if existing.is_some() {
                        return Ok(None);
                    }

                    // 2. Read current streak and transition in memory
                    let current: Option<StreakState> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USER_STREAKS)
                        .obj()
                        .one(&streak_id)
                        .await?;
                    let mut state =
                        current.unwrap_or_else(|| StreakState::new(&visit.user_id, now));
                    let transition = state.apply_visit(visit.visit_date, now);

                    // 3. Create-only visit write
                    db.fluent()
                        .update()
                        .in_col(collections::VISITS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&visit_id)
                        .object(&visit)
                        .add_to_transaction(transaction)?;

                    // 4. Streak write, skipped for backfilled days
                    if transition.is_change() {
                        db.fluent()
                            .update()
                            .in_col(collections::USER_STREAKS)
                            .document_id(&streak_id)
                            .object(&state)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(Some((state, transition)))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Visit transaction failed: {}", e)))?;

        match recorded {
            Some((state, transition)) => {
                tracing::debug!(
                    user_id = %visit.user_id,
                    visit_date = %visit.visit_date,
                    current_streak = state.current_streak,
                    ?transition,
                    "Visit and streak committed"
                );
                Ok(Some(state))
            }
            None => {
                tracing::debug!(
                    user_id = %visit.user_id,
                    visit_date = %visit.visit_date,
                    "Visit already recorded"
                );
                Ok(None)
            }
        }
    }

    async fn insert_visit(&self, visit: &VisitEvent) -> Result<bool> {
        // Create-only insert: Firestore rejects a second document with the same ID.
        let result: std::result::Result<VisitEvent, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::VISITS)
            .document_id(visit.document_id())
            .object(visit)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    user_id = %visit.user_id,
                    visit_date = %visit.visit_date,
                    "Visit already recorded"
                );
                Ok(false)
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn has_visit(&self, user_id: &str, visit_date: NaiveDate) -> Result<bool> {
        let visit: Option<VisitEvent> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::VISITS)
            .obj()
            .one(&visit_document_id(user_id, visit_date))
            .await
            .map_err(db_error)?;
        Ok(visit.is_some())
    }

    async fn count_visits(&self, user_id: &str) -> Result<u64> {
        Ok(self.user_visits(user_id, None).await?.len() as u64)
    }

    async fn latest_visit(&self, user_id: &str) -> Result<Option<VisitEvent>> {
        Ok(self.user_visits(user_id, Some(1)).await?.into_iter().next())
    }

    async fn list_visits(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<VisitEvent>> {
        let user_id = user_id.to_string();
        // Dates are stored as ISO strings, which sort chronologically.
        let start = start.map(|d| d.to_string());
        let end = end.map(|d| d.to_string());

        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::VISITS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    start
                        .clone()
                        .and_then(|s| q.field("visit_date").greater_than_or_equal(s)),
                    end.clone().and_then(|e| q.field("visit_date").less_than(e)),
                ])
            })
            .order_by([("visit_date", FirestoreQueryDirection::Descending)]);

        let query = match limit.and_then(|l| u32::try_from(l).ok()) {
            Some(limit) => query.limit(limit),
            None => query,
        };

        query.obj().query().await.map_err(db_error)
    }

    // ─── Streak State ────────────────────────────────────────────

    async fn get_streak(&self, user_id: &str) -> Result<Option<StreakState>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STREAKS)
            .obj()
            .one(&streak_document_id(user_id))
            .await
            .map_err(db_error)
    }

    async fn delete_streak(&self, user_id: &str) -> Result<bool> {
        let existed = self.get_streak(user_id).await?.is_some();

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USER_STREAKS)
            .document_id(streak_document_id(user_id))
            .execute()
            .await
            .map_err(db_error)?;

        Ok(existed)
    }

    async fn count_streaks(&self, search: Option<&str>) -> Result<u64> {
        if search.is_none() {
            let rows: Vec<CountResult> = self
                .get_client()?
                .fluent()
                .select()
                .from(collections::USER_STREAKS)
                .aggregate(|a| a.fields([a.field("count").count()]))
                .obj()
                .query()
                .await
                .map_err(db_error)?;
            return Ok(rows.first().map_or(0, |r| r.count));
        }

        Ok(self
            .all_streaks()
            .await?
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
        if search.is_none() {
            // Needs the composite index (current_streak desc, user_id asc).
            return self
                .get_client()?
                .fluent()
                .select()
                .from(collections::USER_STREAKS)
                .order_by([
                    ("current_streak", FirestoreQueryDirection::Descending),
                    ("user_id", FirestoreQueryDirection::Ascending),
                ])
                .offset(u32::try_from(skip).unwrap_or(u32::MAX))
                .limit(u32::try_from(limit).unwrap_or(u32::MAX))
                .obj()
                .query()
                .await
                .map_err(db_error);
        }

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        Ok(self
            .all_streaks()
            .await?
            .into_iter()
            .filter(|s| matches_search(&s.user_id, search))
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count_streaks_above(&self, streak: u32) -> Result<u64> {
        let rows: Vec<CountResult> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_STREAKS)
            .filter(move |q| q.for_all([q.field("current_streak").greater_than(streak)]))
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        Ok(rows.first().map_or(0, |r| r.count))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("Closing Firestore store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_document_id_encodes() {
        assert_eq!(streak_document_id("plain"), "plain");
        assert_eq!(streak_document_id("a/b"), "a%2Fb");
    }

    #[tokio::test]
    async fn test_offline_store_reports_database_error() {
        let store = FirestoreStore::new_offline();
        let err = store.get_streak("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
