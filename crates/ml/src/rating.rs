//! ELO-style team ratings.
//!
//! Ratings are path dependent: feeding the same matches in a different order
//! produces different ratings, so [`RatingSystem::process_matches`] applies
//! them strictly in the order given. The store has a single owner and no
//! internal locking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tipster_models::{MatchRecord, OutcomeProbabilities, RatingDelta, RatingPrediction, RatingRank};
use tracing::{debug, info};

/// Draw probability used by [`RatingSystem::predict_match`] when no residual is left for a draw.
const FALLBACK_DRAW_PROB: f64 = 0.25;
const DRAW_RESIDUAL_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RatingConfig {
    /// How far a single result moves a rating.
    pub k_factor: f64,
    /// Rating points added to the home side before computing win expectancy.
    pub home_advantage: f64,
    /// Starting rating for teams not seen before.
    pub base_rating: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            home_advantage: 100.0,
            base_rating: 1500.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingSystem {
    config: RatingConfig,
    ratings: HashMap<String, f64>,
}

impl RatingSystem {
    pub fn new(config: RatingConfig) -> Self {
        Self {
            config,
            ratings: HashMap::new(),
        }
    }

    pub fn with_ratings(config: RatingConfig, ratings: HashMap<String, f64>) -> Self {
        Self { config, ratings }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn ratings(&self) -> &HashMap<String, f64> {
        &self.ratings
    }

    /// Replaces every stored rating.
    pub fn reset(&mut self, ratings: HashMap<String, f64>) {
        self.ratings = ratings;
    }

    pub fn set_rating(&mut self, team: impl Into<String>, rating: f64) {
        self.ratings.insert(team.into(), rating);
    }

    /// Current rating, or the base rating for a team never seen.
    pub fn get_rating(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(self.config.base_rating)
    }

    pub fn is_known(&self, team: &str) -> bool {
        self.ratings.contains_key(team)
    }

    /// Logistic expectancy of side A against side B, in (0, 1).
    pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
    }

    pub fn actual_score(goals_for: u32, goals_against: u32) -> f64 {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        }
    }

    /// Scales the rating change by the size of the win; never below 1.0.
    pub fn margin_multiplier(goal_difference: i64) -> f64 {
        let diff = goal_difference.unsigned_abs();
        match diff {
            0 | 1 => 1.0,
            2 => 1.5,
            _ => (11.0 + diff as f64) / 8.0,
        }
    }

    /// Updates `team` only; the opponent is updated by its own call.
    /// Returns `(old, new)`.
    pub fn update_rating(
        &mut self,
        team: &str,
        opponent: &str,
        goals_for: u32,
        goals_against: u32,
        is_home: bool,
    ) -> (f64, f64) {
        let team_rating = self.get_rating(team);
        let opponent_rating = self.get_rating(opponent);

        let adjusted = if is_home {
            team_rating + self.config.home_advantage
        } else {
            team_rating
        };

        let expected = Self::expected_score(adjusted, opponent_rating);
        let actual = Self::actual_score(goals_for, goals_against);
        let multiplier = Self::margin_multiplier(i64::from(goals_for) - i64::from(goals_against));

        let new_rating = team_rating + self.config.k_factor * multiplier * (actual - expected);
        self.ratings.insert(team.to_string(), new_rating);

        (team_rating, new_rating)
    }

    /// Home side first, then away side. The away update sees the home side's
    /// new rating, so the exchange is not zero-sum.
    pub fn process_match(&mut self, home: &str, away: &str, home_goals: u32, away_goals: u32) -> RatingDelta {
        let (home_old, home_new) = self.update_rating(home, away, home_goals, away_goals, true);
        let (away_old, away_new) = self.update_rating(away, home, away_goals, home_goals, false);

        debug!(
            "{} {}-{} {}: {:+.1} / {:+.1}",
            home,
            home_goals,
            away_goals,
            away,
            home_new - home_old,
            away_new - away_old
        );

        RatingDelta {
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals,
            away_goals,
            home_old,
            home_new,
            home_delta: home_new - home_old,
            away_old,
            away_new,
            away_delta: away_new - away_old,
        }
    }

    /// Applies every match in order, resetting to `initial_ratings` first when given.
    /// Unfinished fixtures are skipped.
    pub fn process_matches<'a, I>(
        &mut self,
        matches: I,
        initial_ratings: Option<HashMap<String, f64>>,
    ) -> Vec<RatingDelta>
    where
        I: IntoIterator<Item = &'a MatchRecord>,
    {
        if let Some(initial) = initial_ratings {
            self.reset(initial);
        }

        let deltas: Vec<RatingDelta> = matches
            .into_iter()
            .filter(|m| m.finished)
            .map(|m| self.process_match(&m.home_team, &m.away_team, m.home_goals, m.away_goals))
            .collect();

        info!("Processed {} matches, {} teams rated", deltas.len(), self.ratings.len());
        deltas
    }

    /// Teams sorted by rating, best first, ranked from 1. Ties keep name order.
    pub fn rankings(&self) -> Vec<RatingRank> {
        let mut teams: Vec<(&String, &f64)> = self.ratings.iter().collect();
        teams.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

        teams
            .into_iter()
            .enumerate()
            .map(|(idx, (team, rating))| RatingRank {
                rank: idx + 1,
                team: team.clone(),
                rating: *rating,
            })
            .collect()
    }

    /// Rating-only outcome estimate for display next to the main prediction.
    pub fn predict_match(&self, home: &str, away: &str) -> RatingPrediction {
        let home_rating = self.get_rating(home);
        let away_rating = self.get_rating(away);
        let home_adjusted = home_rating + self.config.home_advantage;

        let mut home_win = Self::expected_score(home_adjusted, away_rating);
        let mut away_win = Self::expected_score(away_rating, home_adjusted);

        // The two expectancies are complementary, so the residual is zero up to
        // rounding and the fallback applies in practice.
        let mut draw = 1.0 - home_win - away_win;
        if draw < DRAW_RESIDUAL_EPS {
            draw = FALLBACK_DRAW_PROB;
        }

        let total = home_win + draw + away_win;
        home_win /= total;
        draw /= total;
        away_win /= total;

        RatingPrediction {
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_rating,
            away_rating,
            rating_difference: home_rating - away_rating,
            outcome: OutcomeProbabilities { home_win, draw, away_win },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: u32, home: &str, away: &str, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord::new(id, 1, NaiveDate::from_ymd_opt(2024, 8, 24).unwrap(), home, away).with_score(hg, ag)
    }

    #[test]
    fn test_unknown_team_gets_base_rating() {
        let system = RatingSystem::default();
        assert_eq!(system.get_rating("Nobody FC"), 1500.0);
        assert!(!system.is_known("Nobody FC"));
    }

    #[test]
    fn test_expected_score_regression() {
        // 1900 + 100 home advantage against 1820.
        let expected = RatingSystem::expected_score(2000.0, 1820.0);
        assert!((expected - 0.738_109).abs() < 1e-6);
        assert!((RatingSystem::expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_actual_score() {
        assert_eq!(RatingSystem::actual_score(3, 1), 1.0);
        assert_eq!(RatingSystem::actual_score(2, 2), 0.5);
        assert_eq!(RatingSystem::actual_score(0, 1), 0.0);
    }

    #[test]
    fn test_margin_multiplier() {
        assert_eq!(RatingSystem::margin_multiplier(0), 1.0);
        assert_eq!(RatingSystem::margin_multiplier(1), 1.0);
        assert_eq!(RatingSystem::margin_multiplier(-2), 1.5);
        assert_eq!(RatingSystem::margin_multiplier(3), 1.75);
        assert_eq!(RatingSystem::margin_multiplier(5), 2.0);

        let mut prev = 0.0;
        for diff in 0..10 {
            let m = RatingSystem::margin_multiplier(diff);
            assert!(m >= prev);
            prev = m;
        }
    }

    #[test]
    fn test_update_rating_touches_only_team() {
        let mut system = RatingSystem::default();
        let (old, new) = system.update_rating("A", "B", 2, 0, true);

        assert_eq!(old, 1500.0);
        // expected = E(1600, 1500) = 0.64; change = 32 * 1.5 * 0.36
        let expected = RatingSystem::expected_score(1600.0, 1500.0);
        assert!((new - (1500.0 + 32.0 * 1.5 * (1.0 - expected))).abs() < 1e-9);
        assert!(!system.is_known("B"));
    }

    #[test]
    fn test_home_bonus_biases_exchange() {
        let mut first = RatingSystem::default();
        let a = first.process_match("A", "B", 2, 1);

        let mut second = RatingSystem::default();
        let b = second.process_match("B", "A", 1, 2);

        assert!((a.home_delta.abs() - b.away_delta.abs()).abs() > 1e-6);
        assert!((a.away_delta.abs() - b.home_delta.abs()).abs() > 1e-6);
        // Not conserved.
        assert!((a.home_delta + a.away_delta).abs() > 1e-6);
    }

    #[test]
    fn test_process_matches_is_order_dependent() {
        let matches = vec![
            record(1, "A", "B", 3, 0),
            record(2, "B", "C", 1, 1),
            record(3, "C", "A", 2, 1),
        ];
        let mut reversed = matches.clone();
        reversed.reverse();

        let mut forward = RatingSystem::default();
        let deltas = forward.process_matches(&matches, None);
        let mut backward = RatingSystem::default();
        backward.process_matches(&reversed, None);

        assert_eq!(deltas.len(), 3);
        assert!((forward.get_rating("A") - backward.get_rating("A")).abs() > 1e-6);
    }

    #[test]
    fn test_process_matches_resets_and_skips_unfinished() {
        let mut system = RatingSystem::default();
        system.set_rating("Z", 1234.0);

        let upcoming = MatchRecord::new(9, 2, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(), "A", "B");
        let initial: HashMap<String, f64> = [("A".to_string(), 1700.0), ("B".to_string(), 1600.0)].into();
        let deltas = system.process_matches(&[record(1, "A", "B", 1, 0), upcoming], Some(initial));

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].home_old, 1700.0);
        assert!(!system.is_known("Z"));
    }

    #[test]
    fn test_rankings_sorted() {
        let mut system = RatingSystem::default();
        system.set_rating("Low", 1400.0);
        system.set_rating("High", 1900.0);
        system.set_rating("Mid", 1600.0);

        let ranks = system.rankings();
        let names: Vec<&str> = ranks.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid", "Low"]);
        assert_eq!(ranks[0].rank, 1);
    }

    #[test]
    fn test_predict_match_sums_to_one() {
        let mut system = RatingSystem::default();
        system.set_rating("Bayern München", 1900.0);
        system.set_rating("Borussia Dortmund", 1820.0);

        let prediction = system.predict_match("Bayern München", "Borussia Dortmund");
        assert!((prediction.outcome.sum() - 1.0).abs() < 1e-12);
        assert!(prediction.outcome.home_win > prediction.outcome.away_win);
        assert_eq!(prediction.rating_difference, 80.0);
    }
}
