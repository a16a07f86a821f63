//! Per-user streak state, derived from the visit ledger.
//!
//! Stored for O(1) reads so that ranking queries never have to replay the
//! ledger. The record is updated exactly once per new calendar day.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Streak record for a single user.
///
/// Stored at: `user_streaks/{user_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakState {
    pub user_id: String,
    /// Consecutive days ending at `last_visit_date`
    #[serde(default)]
    pub current_streak: u32,
    /// Historical maximum of `current_streak`
    #[serde(default)]
    pub longest_streak: u32,
    /// Most recent counted visit
    #[serde(default)]
    pub last_visit_date: Option<NaiveDate>,
    /// First day of the current streak
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of applying a visit to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First visit ever (or first after a reset)
    Started,
    /// Visit on the day after the last one
    Extended,
    /// At least one full day was missed; the returning day counts as 1
    Restarted,
    /// Same day as (or earlier than) the last counted visit
    Unchanged,
}

impl StreakTransition {
    pub fn is_change(self) -> bool {
        !matches!(self, StreakTransition::Unchanged)
    }
}

impl StreakState {
    /// A user with no counted visits.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            current_streak: 0,
            longest_streak: 0,
            last_visit_date: None,
            start_date: None,
            updated_at: now,
        }
    }

    /// Apply a new (non-duplicate) visit for `today`.
    ///
    /// Pure with respect to `(self, today)`; callers must apply it under a
    /// per-user atomic update.
    pub fn apply_visit(&mut self, today: NaiveDate, now: DateTime<Utc>) -> StreakTransition {
        let transition = match self.last_visit_date {
            None => StreakTransition::Started,
            Some(_) if self.current_streak == 0 => StreakTransition::Started,
            Some(last) if last >= today => StreakTransition::Unchanged,
            Some(last) if today.checked_sub_days(Days::new(1)) == Some(last) => {
                StreakTransition::Extended
            }
            Some(_) => StreakTransition::Restarted,
        };

        match transition {
            StreakTransition::Started | StreakTransition::Restarted => {
                self.current_streak = 1;
                self.start_date = Some(today);
            }
            StreakTransition::Extended => {
                self.current_streak = self.current_streak.saturating_add(1);
            }
            StreakTransition::Unchanged => return transition,
        }

        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_visit_date = Some(today);
        self.updated_at = now;

        transition
    }

    /// Whether the current streak counted a visit on `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.current_streak > 0 && self.last_visit_date == Some(today)
    }
}
