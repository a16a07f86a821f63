// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent same-day visits must produce exactly one ledger entry and
//! exactly one streak transition.

use std::sync::Arc;
use streakboard::db::{MemoryStore, StreakStore};
use streakboard::models::VisitSource;
use streakboard::services::VisitLedger;

mod common;
use common::day;

const NUM_CONCURRENT_VISITS: usize = 10;

async fn race_same_day(store: Arc<dyn StreakStore>, user_id: &str) {
    let ledger = VisitLedger::new(store.clone());

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_VISITS {
        let ledger = ledger.clone();
        let user_id = user_id.to_string();
        handles.push(tokio::spawn(async move {
            ledger
                .record_visit(&user_id, day(3, 2), VisitSource::Visit)
                .await
        }));
    }

    let mut fresh = 0;
    for handle in handles {
        let outcome = handle
            .await
            .expect("Task join failed")
            .expect("Visit recording failed");
        if !outcome.already_recorded {
            fresh += 1;
        }
    }

    assert_eq!(fresh, 1, "Exactly one caller should record the visit");
    assert_eq!(store.count_visits(user_id).await.unwrap(), 1);

    let streak = store
        .get_streak(user_id)
        .await
        .expect("Failed to fetch streak")
        .expect("Streak record not found");
    assert_eq!(
        streak.current_streak, 1,
        "Streak advanced more than once for the same day"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_day_visits_memory() {
    race_same_day(Arc::new(MemoryStore::new()), "racer").await;
}

#[tokio::test]
async fn test_concurrent_same_day_visits_firestore() {
    require_emulator!();

    let store = Arc::new(common::test_firestore().await);
    let user_id = format!("racer-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));
    race_same_day(store, &user_id).await;
}
