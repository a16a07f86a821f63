// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar dates.

use chrono::{Datelike, Local, NaiveDate};

/// Today's calendar date on the server's local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month and first day of the following month: `[start, end)`.
///
/// Returns `None` for an invalid year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, end))
}

/// "YYYY-MM" bucket for a date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
