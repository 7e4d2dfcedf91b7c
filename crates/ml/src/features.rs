//! Per-factor strength functions.
//!
//! Each function turns one kind of input into a [`StrengthPair`] for the two
//! sides. Injuries are the exception: they produce independent per-side
//! penalties that are applied after the weighted combination.

use tipster_models::{InjuryPenalty, MatchOutcome, MatchRecord, StrengthPair};

use crate::rating::RatingSystem;

/// Injured players at which the penalty saturates.
pub const INJURIES_AT_MAX_IMPACT: f64 = 5.0;

/// Logistic of the rating difference, with no home bonus.
pub fn rating_strength(home_rating: f64, away_rating: f64) -> StrengthPair {
    StrengthPair::from_home(RatingSystem::expected_score(home_rating, away_rating))
}

/// Each side's attack averaged with the opponent's defensive concession.
pub fn xg_strength(home_xg_for: f64, home_xg_against: f64, away_xg_for: f64, away_xg_against: f64) -> StrengthPair {
    let home = (home_xg_for + away_xg_against) / 2.0;
    let away = (away_xg_for + home_xg_against) / 2.0;
    StrengthPair::normalized(home, away)
}

pub fn value_strength(home_value: f64, away_value: f64) -> StrengthPair {
    StrengthPair::normalized(home_value, away_value)
}

/// Head-to-head record from the home side's point of view. Only finished
/// matches between exactly these two teams count, at either venue.
pub fn h2h_strength(matches: &[MatchRecord], home_team: &str, away_team: &str) -> StrengthPair {
    let mut home_points = 0.0;
    let mut away_points = 0.0;

    for record in matches.iter().filter(|m| m.is_between(home_team, away_team)) {
        let Some(outcome) = record.outcome() else {
            continue;
        };
        let home_side_was_home = record.home_team == home_team;
        match (outcome, home_side_was_home) {
            (MatchOutcome::Draw, _) => {
                home_points += 0.5;
                away_points += 0.5;
            }
            (MatchOutcome::HomeWin, true) | (MatchOutcome::AwayWin, false) => home_points += 1.0,
            (MatchOutcome::HomeWin, false) | (MatchOutcome::AwayWin, true) => away_points += 1.0,
        }
    }

    StrengthPair::normalized(home_points, away_points)
}

pub fn injury_penalty_for(injured: u32, max_impact: f64) -> f64 {
    let per_player = max_impact / INJURIES_AT_MAX_IMPACT;
    (f64::from(injured) * per_player).min(max_impact)
}

pub fn injury_penalty(home_injured: u32, away_injured: u32, max_impact: f64) -> InjuryPenalty {
    InjuryPenalty {
        home: injury_penalty_for(home_injured, max_impact),
        away: injury_penalty_for(away_injured, max_impact),
    }
}
