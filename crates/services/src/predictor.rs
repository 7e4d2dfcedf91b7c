//! Multi-factor prediction engine.
//!
//! Per-factor strength pairs are blended by configurable weights, scaled by
//! injury penalties, turned into two goal rates and handed to the goal model.

use serde::{Deserialize, Serialize};
use tipster_ml::{
    h2h_strength, injury_penalty, rating_strength, value_strength, xg_strength, GoalModel, GoalModelConfig,
    OddsConfig, OddsConverter,
};
use tipster_models::{
    FactorBreakdown, FactorDefaults, FactorSnapshot, MatchInfo, MatchRecord, OddsMode, OddsQuote, PredictError,
    PredictionReport, Result, StrengthPair,
};
use tracing::{debug, info};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Largest per-side probability mass the score table may drop at `max_lambda`.
pub const MAX_TRUNCATION_LOSS: f64 = 1e-4;

/// Table size that keeps the mass lost at a rate of 8.0 near 1e-5 per side.
const ENGINE_MAX_GOALS: u32 = 22;

/// Blend weights over the strength factors. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FactorWeights {
    pub rating: f64,
    pub xg: f64,
    pub squad_value: f64,
    pub h2h: f64,
    pub odds: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        // 35/30/15/10 over the four non-injury factors, rescaled to a unit sum.
        Self {
            rating: 0.35 / 0.90,
            xg: 0.30 / 0.90,
            squad_value: 0.15 / 0.90,
            h2h: 0.10 / 0.90,
            odds: 0.0,
        }
    }
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.rating + self.xg + self.squad_value + self.h2h + self.odds
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        let all_valid = [self.rating, self.xg, self.squad_value, self.h2h, self.odds]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        if !all_valid || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(PredictError::InvalidWeights { sum });
        }
        Ok(())
    }

    /// Gives odds `odds_weight` and scales the other four so the total stays 1.
    pub fn with_odds(self, odds_weight: f64) -> Self {
        let odds_weight = odds_weight.clamp(0.0, 1.0);
        let others = self.rating + self.xg + self.squad_value + self.h2h;
        if others <= 0.0 {
            return Self { odds: odds_weight, ..self };
        }
        let scale = (1.0 - odds_weight) / others;
        Self {
            rating: self.rating * scale,
            xg: self.xg * scale,
            squad_value: self.squad_value * scale,
            h2h: self.h2h * scale,
            odds: odds_weight,
        }
    }

    pub fn without_odds(self) -> Self {
        self.with_odds(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: FactorWeights,
    pub defaults: FactorDefaults,
    pub odds_mode: OddsMode,
    /// Odds weight switched in when a quote is present and `weights.odds` is zero.
    pub odds_weight: f64,
    /// Share of the odds-implied rates in calibration mode.
    pub calibration_weight: f64,
    pub base_goals: f64,
    pub home_factor: f64,
    pub min_lambda: f64,
    pub max_lambda: f64,
    pub injury_max_impact: f64,
    pub top_scores: usize,
    pub over_under_line: f64,
    pub goal_model: GoalModelConfig,
    pub odds: OddsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            defaults: FactorDefaults::default(),
            odds_mode: OddsMode::Factor,
            odds_weight: 0.20,
            calibration_weight: 0.5,
            base_goals: 1.5,
            home_factor: 1.3,
            min_lambda: 0.1,
            max_lambda: 8.0,
            injury_max_impact: 0.15,
            top_scores: 5,
            over_under_line: 2.5,
            goal_model: GoalModelConfig { max_goals: ENGINE_MAX_GOALS },
            odds: OddsConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if !(0.0..1.0).contains(&self.odds_weight) {
            return Err(PredictError::Config(format!("odds_weight must be in [0, 1), got {}", self.odds_weight)));
        }
        if !(0.0..=1.0).contains(&self.calibration_weight) {
            return Err(PredictError::Config(format!(
                "calibration_weight must be in [0, 1], got {}",
                self.calibration_weight
            )));
        }
        if !(self.min_lambda > 0.0 && self.min_lambda < self.max_lambda) {
            return Err(PredictError::Config(format!(
                "lambda bounds must satisfy 0 < min < max, got [{}, {}]",
                self.min_lambda, self.max_lambda
            )));
        }
        let truncation_loss = 1.0 - GoalModel::poisson_cdf(self.max_lambda, self.goal_model.max_goals);
        if truncation_loss > MAX_TRUNCATION_LOSS {
            return Err(PredictError::Config(format!(
                "goal_model.max_goals {} drops {:.2e} of the mass at max_lambda {}",
                self.goal_model.max_goals, truncation_loss, self.max_lambda
            )));
        }
        if !(0.0..1.0).contains(&self.injury_max_impact) {
            return Err(PredictError::Config(format!(
                "injury_max_impact must be in [0, 1), got {}",
                self.injury_max_impact
            )));
        }
        if !(self.base_goals > 0.0 && self.home_factor > 0.0) {
            return Err(PredictError::Config("base_goals and home_factor must be positive".to_string()));
        }
        Ok(())
    }

    /// Weights actually applied for one prediction.
    pub fn effective_weights(&self, has_odds: bool) -> FactorWeights {
        match self.odds_mode {
            OddsMode::Calibration => self.weights.without_odds(),
            OddsMode::Factor if has_odds && self.weights.odds == 0.0 => self.weights.with_odds(self.odds_weight),
            OddsMode::Factor => self.weights,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictionEngine {
    config: EngineConfig,
    goal_model: GoalModel,
    odds: OddsConverter,
}

impl PredictionEngine {
    /// Rejects an invalid configuration up front.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "🧮 Prediction engine ready (odds mode: {:?}, weights sum {:.3})",
            config.odds_mode,
            config.weights.sum()
        );
        Ok(Self {
            goal_model: GoalModel::new(config.goal_model),
            odds: OddsConverter::new(config.odds),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn goal_model(&self) -> &GoalModel {
        &self.goal_model
    }

    /// Full prediction for one fixture. Pure: the same inputs always give the
    /// same report, and missing optional factors never fail it.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_match(
        &self,
        home_team: &str,
        away_team: &str,
        home_factors: &FactorSnapshot,
        away_factors: &FactorSnapshot,
        h2h: &[MatchRecord],
        odds: Option<&OddsQuote>,
        match_info: Option<MatchInfo>,
    ) -> PredictionReport {
        let cfg = &self.config;
        let home = home_factors.resolve(&cfg.defaults);
        let away = away_factors.resolve(&cfg.defaults);

        let mut defaulted = Vec::new();
        for (team, resolved) in [(home_team, &home), (away_team, &away)] {
            for field in resolved.defaulted_fields() {
                defaulted.push(format!("{}.{}", team, field));
            }
        }
        if !defaulted.is_empty() {
            debug!("Defaults applied for {} vs {}: {:?}", home_team, away_team, defaulted);
        }

        let rating = rating_strength(home.rating, away.rating);
        let xg = xg_strength(home.xg_for.value, home.xg_against.value, away.xg_for.value, away.xg_against.value);
        let squad_value = value_strength(home.squad_value.value, away.squad_value.value);
        let h2h_pair = h2h_strength(h2h, home_team, away_team);
        let penalty = injury_penalty(home.injured_count.value, away.injured_count.value, cfg.injury_max_impact);

        let odds_assessment = odds.map(|quote| self.odds.assess(quote));
        let odds_strength = odds_assessment.as_ref().map_or(StrengthPair::EVEN, |a| a.strength);
        let odds_lambdas = odds_assessment.as_ref().map(|a| (a.home_lambda, a.away_lambda));

        let weights = cfg.effective_weights(odds.is_some());
        let weighted = |pick: fn(&StrengthPair) -> f64| {
            weights.rating * pick(&rating)
                + weights.xg * pick(&xg)
                + weights.squad_value * pick(&squad_value)
                + weights.h2h * pick(&h2h_pair)
                + weights.odds * pick(&odds_strength)
        };
        let combined = StrengthPair::normalized(
            weighted(|p| p.home) * (1.0 - penalty.home),
            weighted(|p| p.away) * (1.0 - penalty.away),
        );

        let (mut home_lambda, mut away_lambda) = self.lambdas_from_strength(&combined);
        if let (OddsMode::Calibration, Some((odds_home, odds_away))) = (cfg.odds_mode, odds_lambdas) {
            let c = cfg.calibration_weight;
            home_lambda = self.clamp_lambda((1.0 - c) * home_lambda + c * odds_home);
            away_lambda = self.clamp_lambda((1.0 - c) * away_lambda + c * odds_away);
            debug!("Calibrated lambdas against odds: ({:.3}, {:.3})", home_lambda, away_lambda);
        }

        let distribution = self.goal_model.predict_match_simple(home_lambda, away_lambda);
        let top_scores = self.goal_model.get_score_probabilities(home_lambda, away_lambda, cfg.top_scores);
        let over_under = self.goal_model.calculate_over_under(home_lambda, away_lambda, cfg.over_under_line);
        let btts = self.goal_model.calculate_btts(home_lambda, away_lambda);

        info!(
            "🎯 {} vs {}: λ=({:.2}, {:.2}) H/D/A={:.3}/{:.3}/{:.3}",
            home_team,
            away_team,
            home_lambda,
            away_lambda,
            distribution.outcome.home_win,
            distribution.outcome.draw,
            distribution.outcome.away_win
        );

        PredictionReport {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            match_info,
            home_lambda,
            away_lambda,
            outcome: distribution.outcome,
            most_likely_score: distribution.most_likely_score,
            top_scores,
            over_under,
            btts,
            breakdown: FactorBreakdown {
                rating,
                xg,
                squad_value,
                h2h: h2h_pair,
                odds: odds_assessment.as_ref().map(|a| a.strength),
                injury_penalty: penalty,
            },
            combined,
            odds_mode: cfg.odds_mode,
            odds_lambdas,
            home_source: home.source,
            away_source: away.source,
            defaulted,
        }
    }

    /// `base × ratio × home_factor` for the home side, `base × inverse ratio` for the away side.
    pub fn lambdas_from_strength(&self, combined: &StrengthPair) -> (f64, f64) {
        let cfg = &self.config;
        let home = cfg.base_goals * (combined.home / combined.away) * cfg.home_factor;
        let away = cfg.base_goals * (combined.away / combined.home);
        (self.clamp_lambda(home), self.clamp_lambda(away))
    }

    fn clamp_lambda(&self, lambda: f64) -> f64 {
        if lambda.is_nan() {
            return self.config.min_lambda;
        }
        lambda.clamp(self.config.min_lambda, self.config.max_lambda)
    }
}
