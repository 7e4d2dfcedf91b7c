// Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use tipster_models::{FactorSnapshot, MatchRecord};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Finished match with a score and no xG.
pub fn create_result(id: u32, week: u32, home: &str, away: &str, home_goals: u32, away_goals: u32) -> MatchRecord {
    MatchRecord::new(id, week, date(2024, 8, 24), home, away).with_score(home_goals, away_goals)
}

pub fn create_fixture(id: u32, week: u32, home: &str, away: &str) -> MatchRecord {
    MatchRecord::new(id, week, date(2024, 12, 14), home, away)
}

pub fn create_full_snapshot(team: &str, rating: f64, xg_for: f64, xg_against: f64, value: f64, injured: u32) -> FactorSnapshot {
    FactorSnapshot::new(team, rating)
        .with_xg(xg_for, xg_against)
        .with_squad_value(value)
        .with_injuries(injured)
}

pub fn create_even_snapshot(team: &str) -> FactorSnapshot {
    create_full_snapshot(team, 1500.0, 1.5, 1.5, 100_000_000.0, 0)
}
