// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod query;
pub mod ranking;
pub mod visits;

pub use query::{RankingParams, RankingQuery};
pub use ranking::RankingEngine;
pub use visits::VisitLedger;
