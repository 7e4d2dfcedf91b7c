use serde::{Deserialize, Serialize};
use tipster_models::{
    DecimalOdds, MarginMethod, OddsFormat, OddsQuote, OutcomeProbabilities, Result, StrengthPair,
};
use tracing::debug;

/// Empirical mapping from outcome probabilities to goal rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OddsConfig {
    /// League-average home goals; also the fallback when no odds are known.
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    /// Goals shifted per unit of home-minus-away probability.
    pub probability_scale: f64,
    pub draw_threshold: f64,
    pub draw_compression: f64,
    pub home_lambda_min: f64,
    pub home_lambda_max: f64,
    pub away_lambda_min: f64,
    pub away_lambda_max: f64,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            avg_home_goals: 1.7,
            avg_away_goals: 1.4,
            probability_scale: 1.2,
            draw_threshold: 0.25,
            draw_compression: 0.7,
            home_lambda_min: 0.5,
            home_lambda_max: 3.5,
            away_lambda_min: 0.5,
            away_lambda_max: 3.0,
        }
    }
}

/// Everything derived from one price triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OddsAssessment {
    pub odds: DecimalOdds,
    /// Raw `1/odds` values; sums above 1 by the bookmaker margin.
    pub implied: OutcomeProbabilities,
    pub fair: OutcomeProbabilities,
    pub margin: f64,
    pub margin_method: MarginMethod,
    pub strength: StrengthPair,
    pub home_lambda: f64,
    pub away_lambda: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OddsConverter {
    config: OddsConfig,
}

impl OddsConverter {
    pub fn new(config: OddsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OddsConfig {
        &self.config
    }

    pub fn odds_to_probability(odds: f64) -> f64 {
        if odds > 0.0 {
            1.0 / odds
        } else {
            0.0
        }
    }

    /// Implied probabilities for a triple in any supported format.
    pub fn implied_probabilities(odds: &OddsFormat) -> Result<OutcomeProbabilities> {
        let (home, draw, away) = odds.to_decimal()?.as_f64();
        Ok(OutcomeProbabilities {
            home_win: Self::odds_to_probability(home),
            draw: Self::odds_to_probability(draw),
            away_win: Self::odds_to_probability(away),
        })
    }

    /// Bookmaker overround: how far the implied triple sums above 1.
    pub fn margin(implied: &OutcomeProbabilities) -> f64 {
        implied.sum() - 1.0
    }

    /// A triple with no positive mass is returned unchanged.
    pub fn remove_margin(implied: &OutcomeProbabilities, method: MarginMethod) -> OutcomeProbabilities {
        match method {
            MarginMethod::AsIs => *implied,
            MarginMethod::Proportional => {
                let total = implied.sum();
                if !(total > 0.0) {
                    return *implied;
                }
                OutcomeProbabilities {
                    home_win: implied.home_win / total,
                    draw: implied.draw / total,
                    away_win: implied.away_win / total,
                }
            }
        }
    }

    pub fn probability_to_lambda(&self, home: f64, draw: f64, away: f64) -> (f64, f64) {
        let cfg = &self.config;
        let shift = (home - away) * cfg.probability_scale;
        let mut home_lambda = cfg.avg_home_goals + shift;
        let mut away_lambda = cfg.avg_away_goals - shift;

        if draw > cfg.draw_threshold {
            let mean = (home_lambda + away_lambda) / 2.0;
            home_lambda = mean + (home_lambda - mean) * cfg.draw_compression;
            away_lambda = mean + (away_lambda - mean) * cfg.draw_compression;
        }

        (
            home_lambda.clamp(cfg.home_lambda_min, cfg.home_lambda_max),
            away_lambda.clamp(cfg.away_lambda_min, cfg.away_lambda_max),
        )
    }

    /// Home/away share of the fair probabilities, draw excluded.
    pub fn odds_strength(fair: &OutcomeProbabilities) -> StrengthPair {
        StrengthPair::normalized(fair.home_win, fair.away_win)
    }

    pub fn fallback_lambdas(&self) -> (f64, f64) {
        (self.config.avg_home_goals, self.config.avg_away_goals)
    }

    pub fn assess(&self, quote: &OddsQuote) -> OddsAssessment {
        let (home, draw, away) = quote.odds.as_f64();
        let implied = OutcomeProbabilities {
            home_win: Self::odds_to_probability(home),
            draw: Self::odds_to_probability(draw),
            away_win: Self::odds_to_probability(away),
        };
        let fair = Self::remove_margin(&implied, quote.margin_method);

        let (home_lambda, away_lambda) = if fair.sum() > 0.0 {
            self.probability_to_lambda(fair.home_win, fair.draw, fair.away_win)
        } else {
            debug!("Odds from {} carry no information, using league averages", quote.source);
            self.fallback_lambdas()
        };

        OddsAssessment {
            odds: quote.odds.clone(),
            margin: Self::margin(&implied),
            implied,
            fair,
            margin_method: quote.margin_method,
            strength: Self::odds_strength(&fair),
            home_lambda,
            away_lambda,
            source: quote.source.clone(),
        }
    }
}
