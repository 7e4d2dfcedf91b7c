use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::factors::{InjuryPenalty, StrengthPair};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomeProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PredictedOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl OutcomeProbabilities {
    pub fn sum(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }

    pub fn most_likely_outcome(&self) -> PredictedOutcome {
        if self.home_win >= self.away_win && self.home_win >= self.draw {
            PredictedOutcome::HomeWin
        } else if self.away_win >= self.draw {
            PredictedOutcome::AwayWin
        } else {
            PredictedOutcome::Draw
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreProbability {
    pub home_goals: u32,
    pub away_goals: u32,
    pub probability: f64,
}

impl ScoreProbability {
    pub fn label(&self) -> String {
        format!("{}:{}", self.home_goals, self.away_goals)
    }
}

/// Closed-form scoreline distribution for one pair of goal rates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDistribution {
    pub home_lambda: f64,
    pub away_lambda: f64,
    pub outcome: OutcomeProbabilities,
    pub most_likely_score: ScoreProbability,
    /// `table[home_goals][away_goals]`, truncated at `max_goals` per side.
    pub table: Vec<Vec<f64>>,
}

impl MatchDistribution {
    /// Probability mass captured by the truncated table.
    pub fn total_mass(&self) -> f64 {
        self.table.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub home_lambda: f64,
    pub away_lambda: f64,
    pub n_simulations: u32,
    pub outcome: OutcomeProbabilities,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    pub home_goals_std: f64,
    pub away_goals_std: f64,
    pub most_common_score: (u32, u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OverUnder {
    pub threshold: f64,
    pub total_lambda: f64,
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Btts {
    pub yes: f64,
    pub no: f64,
    pub home_zero: f64,
    pub away_zero: f64,
}

/// Old and new ratings of both sides after one processed match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingDelta {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_old: f64,
    pub home_new: f64,
    pub home_delta: f64,
    pub away_old: f64,
    pub away_new: f64,
    pub away_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingRank {
    pub rank: usize,
    pub team: String,
    pub rating: f64,
}

/// Rating-only outcome estimate. Informational; the goal model is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingPrediction {
    pub home_team: String,
    pub away_team: String,
    pub home_rating: f64,
    pub away_rating: f64,
    pub rating_difference: f64,
    pub outcome: OutcomeProbabilities,
}

/// How betting odds feed into a prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OddsMode {
    /// Odds strength is one more weighted factor.
    #[default]
    Factor,
    /// Odds-implied goal rates recalibrate the final lambdas.
    Calibration,
}

/// Per-factor strengths that went into the combined strength.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorBreakdown {
    pub rating: StrengthPair,
    pub xg: StrengthPair,
    pub squad_value: StrengthPair,
    pub h2h: StrengthPair,
    pub odds: Option<StrengthPair>,
    pub injury_penalty: InjuryPenalty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchInfo {
    pub week: Option<u32>,
    pub date: Option<NaiveDate>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionReport {
    pub home_team: String,
    pub away_team: String,
    pub match_info: Option<MatchInfo>,
    pub home_lambda: f64,
    pub away_lambda: f64,
    pub outcome: OutcomeProbabilities,
    pub most_likely_score: ScoreProbability,
    pub top_scores: Vec<ScoreProbability>,
    pub over_under: OverUnder,
    pub btts: Btts,
    pub breakdown: FactorBreakdown,
    pub combined: StrengthPair,
    pub odds_mode: OddsMode,
    /// Odds-implied goal rates, present when odds were supplied.
    pub odds_lambdas: Option<(f64, f64)>,
    pub home_source: Option<String>,
    pub away_source: Option<String>,
    /// Factors that fell back to defaults, as `team.field`.
    pub defaulted: Vec<String>,
}

impl PredictionReport {
    pub fn most_likely_outcome(&self) -> PredictedOutcome {
        self.outcome.most_likely_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_likely_outcome() {
        let home = OutcomeProbabilities { home_win: 0.6, draw: 0.25, away_win: 0.15 };
        let draw = OutcomeProbabilities { home_win: 0.3, draw: 0.4, away_win: 0.3 };
        let away = OutcomeProbabilities { home_win: 0.2, draw: 0.3, away_win: 0.5 };

        assert_eq!(home.most_likely_outcome(), PredictedOutcome::HomeWin);
        assert_eq!(draw.most_likely_outcome(), PredictedOutcome::Draw);
        assert_eq!(away.most_likely_outcome(), PredictedOutcome::AwayWin);
    }

    #[test]
    fn test_score_label() {
        let score = ScoreProbability { home_goals: 2, away_goals: 1, probability: 0.0859 };
        assert_eq!(score.label(), "2:1");
    }
}
