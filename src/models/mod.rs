// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod ranking;
pub mod streak;
pub mod visit;

pub use ranking::{Pagination, RankPosition, RankingEntry, RankingPage};
pub use streak::{StreakState, StreakTransition};
pub use visit::{VisitEvent, VisitSource};
