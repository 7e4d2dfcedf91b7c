//! Independent-Poisson goal model.
//!
//! Each side's goal count is Poisson with its own rate; the two are treated as
//! independent. Scoreline tables are truncated at `max_goals` per side and the
//! mass beyond the cap is dropped, not redistributed, so outcome totals fall
//! slightly short of 1.0 for high rates.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use tipster_models::{
    Btts, MatchDistribution, OutcomeProbabilities, OverUnder, ScoreProbability, SimulationResult,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoalModelConfig {
    pub max_goals: u32,
}

impl Default for GoalModelConfig {
    fn default() -> Self {
        Self { max_goals: 10 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GoalModel {
    config: GoalModelConfig,
}

impl GoalModel {
    pub fn new(config: GoalModelConfig) -> Self {
        Self { config }
    }

    pub fn max_goals(&self) -> u32 {
        self.config.max_goals
    }

    /// Expected goals from attack strength, opponent defensive weakness and a home multiplier.
    pub fn calculate_lambda(team_attack: f64, opponent_defense: f64, home_advantage: f64) -> f64 {
        team_attack * opponent_defense * home_advantage
    }

    /// Poisson PMF, evaluated in log space so large `k` does not overflow.
    /// A non-positive rate is certainty of zero goals.
    pub fn poisson_probability(lambda: f64, k: u32) -> f64 {
        if !(lambda > 0.0) {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        let k_f = f64::from(k);
        (k_f * lambda.ln() - lambda - ln_factorial(k)).exp()
    }

    /// P(X <= k) for X ~ Poisson(lambda). Terms come from the ratio
    /// `p(i) = p(i-1)·λ/i`, and the sum stops once the remaining tail is below
    /// rounding, so a huge `k` costs no more than a few multiples of `λ`.
    pub fn poisson_cdf(lambda: f64, k: u32) -> f64 {
        if !(lambda > 0.0) {
            return 1.0;
        }
        let ln_lambda = lambda.ln();
        let mut ln_term = -lambda;
        let mut cdf = ln_term.exp();

        for i in 1..=k {
            let i_f = f64::from(i);
            ln_term += ln_lambda - i_f.ln();
            let term = ln_term.exp();
            cdf += term;
            // Past 2λ each term is less than half the previous one, so the tail is below `term`.
            if i_f > 2.0 * lambda && term <= f64::EPSILON * cdf {
                break;
            }
        }
        cdf.min(1.0)
    }

    fn pmf_vector(&self, lambda: f64) -> Vec<f64> {
        (0..=self.config.max_goals)
            .map(|k| Self::poisson_probability(lambda, k))
            .collect()
    }

    fn score_table(&self, home_lambda: f64, away_lambda: f64) -> Vec<Vec<f64>> {
        let home = self.pmf_vector(home_lambda);
        let away = self.pmf_vector(away_lambda);
        home.iter()
            .map(|p_home| away.iter().map(|p_away| p_home * p_away).collect())
            .collect()
    }

    /// Full scoreline table plus outcome totals and the single most likely score.
    pub fn predict_match_simple(&self, home_lambda: f64, away_lambda: f64) -> MatchDistribution {
        let table = self.score_table(home_lambda, away_lambda);

        let mut home_win = 0.0;
        let mut draw = 0.0;
        let mut away_win = 0.0;
        let mut best = ScoreProbability { home_goals: 0, away_goals: 0, probability: f64::NEG_INFINITY };

        for (i, row) in table.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                match i.cmp(&j) {
                    std::cmp::Ordering::Greater => home_win += p,
                    std::cmp::Ordering::Equal => draw += p,
                    std::cmp::Ordering::Less => away_win += p,
                }
                // Strictly greater keeps the first maximum in row-major order.
                if p > best.probability {
                    best = ScoreProbability { home_goals: i as u32, away_goals: j as u32, probability: p };
                }
            }
        }

        MatchDistribution {
            home_lambda,
            away_lambda,
            outcome: OutcomeProbabilities { home_win, draw, away_win },
            most_likely_score: best,
            table,
        }
    }

    /// Outcome probabilities from xG with an additive home boost.
    pub fn predict_with_xg(&self, home_xg: f64, away_xg: f64, home_boost: f64) -> MatchDistribution {
        self.predict_match_simple(home_xg + home_boost, away_xg)
    }

    /// Scorelines by descending probability, ties broken by fewer total goals
    /// and then fewer home goals.
    pub fn get_score_probabilities(&self, home_lambda: f64, away_lambda: f64, top_n: usize) -> Vec<ScoreProbability> {
        let table = self.score_table(home_lambda, away_lambda);
        let mut scores: Vec<ScoreProbability> = table
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter().enumerate().map(move |(j, &p)| ScoreProbability {
                    home_goals: i as u32,
                    away_goals: j as u32,
                    probability: p,
                })
            })
            .collect();

        scores.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| (a.home_goals + a.away_goals).cmp(&(b.home_goals + b.away_goals)))
                .then_with(|| a.home_goals.cmp(&b.home_goals))
        });
        scores.truncate(top_n);
        scores
    }

    /// Over/under a goal line. The total of two independent Poisson variables is
    /// Poisson with the summed rate, so this is exact under the model.
    pub fn calculate_over_under(&self, home_lambda: f64, away_lambda: f64, threshold: f64) -> OverUnder {
        let total_lambda = home_lambda + away_lambda;
        let under = if threshold < 0.0 {
            0.0
        } else {
            Self::poisson_cdf(total_lambda, threshold.floor() as u32)
        };

        OverUnder {
            threshold,
            total_lambda,
            over: 1.0 - under,
            under,
        }
    }

    pub fn calculate_btts(&self, home_lambda: f64, away_lambda: f64) -> Btts {
        let home_zero = Self::poisson_probability(home_lambda, 0);
        let away_zero = Self::poisson_probability(away_lambda, 0);
        let yes = (1.0 - home_zero) * (1.0 - away_zero);

        Btts {
            yes,
            no: 1.0 - yes,
            home_zero,
            away_zero,
        }
    }

    /// Monte Carlo cross-check of [`GoalModel::predict_match_simple`].
    /// At least one match is always simulated.
    pub fn simulate_match<R: Rng + ?Sized>(
        &self,
        home_lambda: f64,
        away_lambda: f64,
        n_simulations: u32,
        rng: &mut R,
    ) -> SimulationResult {
        let n = n_simulations.max(1);
        let home_sampler = goal_sampler(home_lambda);
        let away_sampler = goal_sampler(away_lambda);

        let mut home_wins = 0u32;
        let mut draws = 0u32;
        let mut away_wins = 0u32;
        let mut home_stats = RunningStats::default();
        let mut away_stats = RunningStats::default();
        let mut score_counts: HashMap<(u32, u32), u32> = HashMap::new();

        for _ in 0..n {
            let home_goals = draw_goals(home_sampler.as_ref(), rng);
            let away_goals = draw_goals(away_sampler.as_ref(), rng);

            match home_goals.cmp(&away_goals) {
                std::cmp::Ordering::Greater => home_wins += 1,
                std::cmp::Ordering::Equal => draws += 1,
                std::cmp::Ordering::Less => away_wins += 1,
            }
            home_stats.push(f64::from(home_goals));
            away_stats.push(f64::from(away_goals));
            *score_counts.entry((home_goals, away_goals)).or_insert(0) += 1;
        }

        let most_common_score = score_counts
            .into_iter()
            .max_by(|(a_score, a_count), (b_score, b_count)| {
                a_count
                    .cmp(b_count)
                    .then_with(|| (b_score.0 + b_score.1).cmp(&(a_score.0 + a_score.1)))
                    .then_with(|| b_score.0.cmp(&a_score.0))
            })
            .map_or((0, 0), |(score, _)| score);

        let total = f64::from(n);
        debug!("Simulated {} matches at λ=({:.2}, {:.2})", n, home_lambda, away_lambda);

        SimulationResult {
            home_lambda,
            away_lambda,
            n_simulations: n,
            outcome: OutcomeProbabilities {
                home_win: f64::from(home_wins) / total,
                draw: f64::from(draws) / total,
                away_win: f64::from(away_wins) / total,
            },
            avg_home_goals: home_stats.mean(),
            avg_away_goals: away_stats.mean(),
            home_goals_std: home_stats.std_dev(),
            away_goals_std: away_stats.std_dev(),
            most_common_score,
        }
    }

    /// Reproducible simulation from a fixed seed.
    pub fn simulate_match_seeded(
        &self,
        home_lambda: f64,
        away_lambda: f64,
        n_simulations: u32,
        seed: u64,
    ) -> SimulationResult {
        let mut rng = StdRng::seed_from_u64(seed);
        self.simulate_match(home_lambda, away_lambda, n_simulations, &mut rng)
    }
}

fn ln_factorial(k: u32) -> f64 {
    (2..=k).map(|i| f64::from(i).ln()).sum()
}

/// `None` for a non-positive or non-finite rate: that side never scores.
fn goal_sampler(lambda: f64) -> Option<Poisson<f64>> {
    if lambda > 0.0 && lambda.is_finite() {
        Poisson::new(lambda).ok()
    } else {
        None
    }
}

fn draw_goals<R: Rng + ?Sized>(sampler: Option<&Poisson<f64>>, rng: &mut R) -> u32 {
    sampler.map_or(0, |poisson| poisson.sample(rng) as u32)
}

/// Welford accumulator; reports the population standard deviation.
#[derive(Debug, Default)]
struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisson_probability_matches_closed_form() {
        // e^-2.5 * 2.5^2 / 2
        let expected = (-2.5f64).exp() * 2.5 * 2.5 / 2.0;
        assert!((GoalModel::poisson_probability(2.5, 2) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_poisson_degenerate_rate() {
        assert_eq!(GoalModel::poisson_probability(0.0, 0), 1.0);
        assert_eq!(GoalModel::poisson_probability(0.0, 3), 0.0);
        assert_eq!(GoalModel::poisson_probability(-1.0, 0), 1.0);
    }

    #[test]
    fn test_poisson_large_k_does_not_overflow() {
        let p = GoalModel::poisson_probability(3.0, 400);
        assert!(p.is_finite());
        assert!(p >= 0.0 && p < 1e-300);

        let near_mode = GoalModel::poisson_probability(150.0, 150);
        assert!(near_mode.is_finite() && near_mode > 0.03);
    }

    #[test]
    fn test_regression_two_and_a_half_vs_one_and_a_half() {
        let model = GoalModel::default();
        let dist = model.predict_match_simple(2.5, 1.5);

        assert_eq!((dist.most_likely_score.home_goals, dist.most_likely_score.away_goals), (2, 1));
        assert!((dist.most_likely_score.probability - 0.085_854_557).abs() < 1e-8);
        assert!((dist.outcome.home_win - 0.593_999_176).abs() < 1e-8);
        assert!((dist.outcome.draw - 0.185_557_388).abs() < 1e-8);
        assert!((dist.outcome.away_win - 0.220_381_258).abs() < 1e-8);
        assert!(dist.outcome.home_win > dist.outcome.away_win);
        assert_eq!(dist.table.len(), 11);
        assert_eq!(dist.table[0].len(), 11);
    }

    #[test]
    fn test_outcomes_equal_table_mass() {
        let model = GoalModel::default();
        let dist = model.predict_match_simple(1.7, 1.1);
        assert!((dist.outcome.sum() - dist.total_mass()).abs() < 1e-12);
        assert!((dist.outcome.sum() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_truncation_is_not_renormalized() {
        let model = GoalModel::new(GoalModelConfig { max_goals: 2 });
        let dist = model.predict_match_simple(2.0, 2.0);
        assert!(dist.total_mass() < 0.5);
    }

    #[test]
    fn test_score_probabilities_ordering() {
        let model = GoalModel::default();
        let scores = model.get_score_probabilities(2.5, 1.5, 5);
        let labels: Vec<String> = scores.iter().map(|s| s.label()).collect();

        assert_eq!(labels, vec!["2:1", "3:1", "1:1", "2:2", "2:0"]);
        assert!(scores.windows(2).all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn test_score_probabilities_tie_break() {
        let model = GoalModel::default();
        let scores = model.get_score_probabilities(1.2, 1.2, 4);

        // 1:0 and 0:1 carry identical mass; the home-goals tie-break puts 0:1 first.
        assert_eq!(scores[0].label(), "1:1");
        assert_eq!(scores[1].label(), "0:1");
        assert_eq!(scores[2].label(), "1:0");
        assert_eq!(scores[1].probability, scores[2].probability);
    }

    #[test]
    fn test_over_under() {
        let model = GoalModel::default();
        let ou = model.calculate_over_under(2.5, 1.5, 2.5);

        assert!((ou.under - 0.238_103_306).abs() < 1e-8);
        assert!((ou.over + ou.under - 1.0).abs() < 1e-12);
        assert_eq!(ou.total_lambda, 4.0);

        let negative = model.calculate_over_under(1.0, 1.0, -0.5);
        assert_eq!(negative.over, 1.0);
    }

    #[test]
    fn test_btts() {
        let model = GoalModel::default();
        let btts = model.calculate_btts(2.5, 1.5);

        assert!((btts.yes - 0.713_100_480).abs() < 1e-8);
        assert_eq!(btts.yes + btts.no, 1.0);
    }

    #[test]
    fn test_simulation_is_reproducible_with_seed() {
        let model = GoalModel::default();
        let a = model.simulate_match_seeded(1.8, 1.2, 2_000, 7);
        let b = model.simulate_match_seeded(1.8, 1.2, 2_000, 7);
        assert_eq!(a, b);
        assert_eq!(a.n_simulations, 2_000);
    }

    #[test]
    fn test_simulation_tracks_closed_form() {
        let model = GoalModel::default();
        let sim = model.simulate_match_seeded(2.5, 1.5, 10_000, 42);
        let exact = model.predict_match_simple(2.5, 1.5);

        assert!((sim.outcome.home_win - exact.outcome.home_win).abs() < 0.02);
        assert!((sim.outcome.draw - exact.outcome.draw).abs() < 0.02);
        assert!((sim.outcome.away_win - exact.outcome.away_win).abs() < 0.02);
        assert!((sim.avg_home_goals - 2.5).abs() < 0.1);
        assert!((sim.home_goals_std - 2.5f64.sqrt()).abs() < 0.1);
        assert!((sim.outcome.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_simulations_runs_one() {
        let model = GoalModel::default();
        let sim = model.simulate_match_seeded(1.0, 1.0, 0, 1);
        assert_eq!(sim.n_simulations, 1);
        assert!((sim.outcome.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_large_rate_sampling_mean() {
        let model = GoalModel::default();
        let sim = model.simulate_match_seeded(80.0, 0.0, 2_000, 3);
        assert!((sim.avg_home_goals - 80.0).abs() < 1.5);
        assert_eq!(sim.avg_away_goals, 0.0);
        assert_eq!(sim.outcome.home_win, 1.0);
    }

    #[test]
    fn test_degenerate_rates_never_score() {
        let model = GoalModel::default();
        let sim = model.simulate_match_seeded(f64::INFINITY, f64::NAN, 50, 9);
        assert_eq!(sim.avg_home_goals, 0.0);
        assert_eq!(sim.avg_away_goals, 0.0);
        assert_eq!(sim.outcome.draw, 1.0);
    }

    #[test]
    fn test_poisson_cdf_matches_pmf_sum() {
        for (lambda, k) in [(0.4, 0), (2.7, 3), (4.0, 2), (12.5, 20)] {
            let direct: f64 = (0..=k).map(|i| GoalModel::poisson_probability(lambda, i)).sum();
            assert!((GoalModel::poisson_cdf(lambda, k) - direct).abs() < 1e-12);
        }
        assert_eq!(GoalModel::poisson_cdf(0.0, 0), 1.0);
    }

    #[test]
    fn test_over_under_huge_line_returns_quickly() {
        let model = GoalModel::default();
        let started = std::time::Instant::now();
        let ou = model.calculate_over_under(1.5, 1.2, 1e9);
        let saturated = model.calculate_over_under(1.5, 1.2, 1e15);

        assert!(started.elapsed() < std::time::Duration::from_millis(100));
        assert!((ou.under - 1.0).abs() < 1e-12);
        assert!(ou.over.abs() < 1e-12);
        assert!((saturated.under - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_lambda_and_xg() {
        assert!((GoalModel::calculate_lambda(1.2, 1.1, 1.3) - 1.716).abs() < 1e-12);

        let model = GoalModel::default();
        let dist = model.predict_with_xg(2.2, 1.5, 0.3);
        assert!((dist.home_lambda - 2.5).abs() < 1e-12);
    }
}
