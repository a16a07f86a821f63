// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use streakboard::config::Config;
use streakboard::db::{FirestoreStore, MemoryStore, StreakStore};
use streakboard::models::StreakState;
use streakboard::routes::create_router;
use streakboard::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store connected to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fixed calendar day in 2024.
#[allow(dead_code)]
pub fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, d).unwrap()
}

/// A streak record with the given current streak, as if it ended on `last`.
#[allow(dead_code)]
pub fn streak(user_id: &str, current: u32, last: NaiveDate) -> StreakState {
    let mut state = StreakState::new(user_id, Utc::now());
    state.current_streak = current;
    state.longest_streak = current;
    state.last_visit_date = Some(last);
    state.start_date = last.checked_sub_days(chrono::Days::new(u64::from(current.max(1)) - 1));
    state
}

/// Create a test app over a fresh in-memory store.
/// Returns the router, the shared state and the store for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        Config::test_default(),
        store.clone() as Arc<dyn StreakStore>,
    ));

    (create_router(state.clone()), state, store)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
