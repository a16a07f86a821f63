// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Visit ledger records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// What kind of activity produced a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum VisitSource {
    /// App open / explicit check-in
    #[default]
    Visit,
    /// User answered a card correctly
    CorrectAnswer,
}

impl fmt::Display for VisitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitSource::Visit => f.write_str("visit"),
            VisitSource::CorrectAnswer => f.write_str("correct_answer"),
        }
    }
}

/// One user's recorded activity on one calendar day.
///
/// Stored in the `visits` collection. At most one record exists per
/// `(user_id, visit_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VisitEvent {
    pub user_id: String,
    /// Calendar day (YYYY-MM-DD), no time component
    pub visit_date: NaiveDate,
    /// When the record was inserted
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub source: VisitSource,
}

impl VisitEvent {
    pub fn new(user_id: &str, visit_date: NaiveDate, source: VisitSource) -> Self {
        Self {
            user_id: user_id.to_string(),
            visit_date,
            recorded_at: Utc::now(),
            source,
        }
    }

    /// Deterministic document ID: one document per user per day.
    pub fn document_id(&self) -> String {
        visit_document_id(&self.user_id, self.visit_date)
    }
}

/// Build the `visits` document ID for a user and day.
///
/// The user ID is URL-encoded so that arbitrary IDs are valid Firestore
/// document names.
pub fn visit_document_id(user_id: &str, visit_date: NaiveDate) -> String {
    format!("{}_{}", urlencoding::encode(user_id), visit_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_per_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let a = VisitEvent::new("u1", day, VisitSource::Visit);
        let b = VisitEvent::new("u1", day, VisitSource::CorrectAnswer);

        assert_eq!(a.document_id(), "u1_2024-01-05");
        assert_eq!(a.document_id(), b.document_id());
    }

    #[test]
    fn test_document_id_encodes_user_id() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(visit_document_id("a/b c", day), "a%2Fb%20c_2024-01-05");
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&VisitSource::CorrectAnswer).unwrap();
        assert_eq!(json, "\"correct_answer\"");
        assert_eq!(VisitSource::Visit.to_string(), "visit");
    }
}
