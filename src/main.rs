//! Bundesliga match predictor CLI.
//!
//! Runs the full pipeline against a seeded mock season: ratings from played
//! matches, factor snapshots from the reference table, then the blended
//! prediction for one fixture or a whole matchday.

mod config;

use std::str::FromStr;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crate::config::AppConfig;
use rust_decimal::Decimal;
use tipster_ml::{OddsConverter, RatingSystem};
use tipster_models::{MatchInfo, MatchRecord, OddsFormat, OddsMode, OddsQuote};
use tipster_services::{
    base_ratings, build_cache, current_matchday, format_prediction_report, generate_mock_season, league_table,
    load_ratings, matchday, save_ratings, season_start_year, season_string, team_xg_stats, FactorService,
    MockSeasonConfig, PredictionEngine, ReferenceProvider,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tipster")]
#[command(about = "Football match outcome prediction: ratings, Poisson goals and factor blending", long_about = None)]
struct Cli {
    /// Override the mock season seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// How betting odds feed into predictions
    #[arg(long, global = true, value_enum)]
    odds_mode: Option<ModeArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a single fixture
    Predict {
        /// Home team (name or short name)
        home: String,
        /// Away team (name or short name)
        away: String,
        /// Odds triple: decimal "2.5,3.4,2.8", American "+150,+220,-120" or fractional "3/2,12/5,4/5"
        #[arg(long, value_parser = parse_odds)]
        odds: Option<OddsFormat>,
        /// Use the reference bookmaker prices for this fixture
        #[arg(long, conflicts_with = "odds")]
        mock_odds: bool,
        /// Treat --odds as exchange prices and keep their implied probabilities as-is
        #[arg(long, requires = "odds")]
        exchange: bool,
        /// Cross-check with a Monte Carlo run of this many matches
        #[arg(long)]
        simulate: Option<u32>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict every fixture of a matchday
    Matchday {
        /// Matchday number (defaults to the next unplayed one)
        week: Option<u32>,
        /// Use the reference bookmaker prices
        #[arg(long)]
        mock_odds: bool,
    },
    /// Show team ratings after the played matches
    Ratings {
        /// Only show the top N teams
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show the league table with xG per match
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Factor,
    Calibration,
}

impl From<ModeArg> for OddsMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Factor => OddsMode::Factor,
            ModeArg::Calibration => OddsMode::Calibration,
        }
    }
}

fn parse_odds(raw: &str) -> std::result::Result<OddsFormat, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let &[home, draw, away] = parts.as_slice() else {
        return Err(format!("expected three comma-separated prices, got '{}'", raw));
    };

    if parts.iter().any(|p| p.contains('/')) {
        return Ok(OddsFormat::Fractional { home: home.to_string(), draw: draw.to_string(), away: away.to_string() });
    }
    if parts.iter().any(|p| p.starts_with('+') || p.starts_with('-')) {
        let american = |p: &str| p.parse::<i32>().map_err(|e| format!("invalid American odds '{}': {}", p, e));
        return Ok(OddsFormat::American { home: american(home)?, draw: american(draw)?, away: american(away)? });
    }
    let decimal = |p: &str| Decimal::from_str(p).map_err(|e| format!("invalid decimal odds '{}': {}", p, e));
    Ok(OddsFormat::Decimal { home: decimal(home)?, draw: decimal(draw)?, away: decimal(away)? })
}

fn cli_quote(format: &OddsFormat, exchange: bool) -> Result<OddsQuote> {
    let odds = format.to_decimal()?;
    Ok(if exchange { OddsQuote::exchange(odds, "cli") } else { OddsQuote::bookmaker(odds, "cli") })
}

/// Everything a command needs, built once from configuration.
struct Context {
    config: AppConfig,
    season: Vec<MatchRecord>,
    ratings: RatingSystem,
    factors: FactorService<ReferenceProvider>,
    engine: PredictionEngine,
}

impl Context {
    fn build(mut config: AppConfig, cli: &Cli) -> Result<Self> {
        if let Some(seed) = cli.seed {
            config.season.seed = seed;
        }
        if let Some(mode) = cli.odds_mode {
            config.engine.odds_mode = mode.into();
        }
        config.validate().context("invalid configuration")?;

        let season = generate_mock_season(&MockSeasonConfig::from(&config.season));
        let cache = build_cache(&config.cache);

        let ratings_key = format!("ratings_{}_{}", config.season.start_date, config.season.seed);
        let mut ratings = RatingSystem::with_ratings(config.rating, base_ratings());
        if load_ratings(cache.as_ref(), &ratings_key, &mut ratings) {
            info!("📦 Ratings restored from cache");
        } else {
            ratings.process_matches(&season, Some(base_ratings()));
            if !save_ratings(cache.as_ref(), &ratings_key, &ratings) {
                warn!("Ratings were not cached");
            }
        }

        let engine = PredictionEngine::new(config.engine.clone())?;
        let factors = FactorService::new(ReferenceProvider::new(season.clone()), cache);

        Ok(Self { config, season, ratings, factors, engine })
    }

    fn fixture_info(&self, home: &str, away: &str) -> Option<MatchInfo> {
        self.season
            .iter()
            .find(|m| !m.finished && m.home_team == home && m.away_team == away)
            .map(|m| MatchInfo {
                week: Some(m.week),
                date: Some(m.date),
                venue: Some(format!("{} Arena", m.home_team)),
            })
    }

    fn predict(&self, home_query: &str, away_query: &str, odds: Option<OddsQuote>, json: bool) -> Result<(f64, f64)> {
        let home = self.factors.snapshot(home_query, &self.ratings)?;
        let away = self.factors.snapshot(away_query, &self.ratings)?;
        let info = self.fixture_info(&home.team, &away.team);

        let report = self.engine.predict_match(&home.team, &away.team, &home, &away, &self.season, odds.as_ref(), info);

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", format_prediction_report(&report));
            let elo = self.ratings.predict_match(&home.team, &away.team);
            println!(
                "  Rating-only view: {:.0} vs {:.0} → H {:.1}% D {:.1}% A {:.1}%",
                elo.home_rating,
                elo.away_rating,
                elo.outcome.home_win * 100.0,
                elo.outcome.draw * 100.0,
                elo.outcome.away_win * 100.0
            );
        }
        Ok((report.home_lambda, report.away_lambda))
    }

    fn odds_for(
        &self,
        home_query: &str,
        away_query: &str,
        explicit: Option<&OddsFormat>,
        exchange: bool,
        mock: bool,
    ) -> Result<Option<OddsQuote>> {
        if let Some(format) = explicit {
            let implied = OddsConverter::implied_probabilities(format)?;
            info!(
                "💱 Implied H {:.1}% D {:.1}% A {:.1}% (margin {:+.1}%)",
                implied.home_win * 100.0,
                implied.draw * 100.0,
                implied.away_win * 100.0,
                OddsConverter::margin(&implied) * 100.0
            );
            return Ok(Some(cli_quote(format, exchange)?));
        }
        if mock {
            let home = self.factors.resolve_team(home_query)?;
            let away = self.factors.resolve_team(away_query)?;
            return Ok(self.factors.odds(&home, &away));
        }
        Ok(None)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::new().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting tipster");
    let ctx = Context::build(config, &cli)?;
    info!("✅ Season ready: {} matches, odds mode {:?}", ctx.season.len(), ctx.config.engine.odds_mode);

    match &cli.command {
        Commands::Predict { home, away, odds, mock_odds, exchange, simulate, json } => {
            let quote = ctx.odds_for(home, away, odds.as_ref(), *exchange, *mock_odds)?;
            let (home_lambda, away_lambda) = ctx.predict(home, away, quote, *json)?;

            if let Some(n) = simulate {
                let sim = ctx.engine.goal_model().simulate_match_seeded(home_lambda, away_lambda, *n, ctx.config.season.seed);
                println!(
                    "\nMonte Carlo ({} runs): H {:.1}% D {:.1}% A {:.1}% | avg goals {:.2} - {:.2} (σ {:.2} / {:.2}) | most common {}:{}",
                    sim.n_simulations,
                    sim.outcome.home_win * 100.0,
                    sim.outcome.draw * 100.0,
                    sim.outcome.away_win * 100.0,
                    sim.avg_home_goals,
                    sim.avg_away_goals,
                    sim.home_goals_std,
                    sim.away_goals_std,
                    sim.most_common_score.0,
                    sim.most_common_score.1
                );
            }
        }
        Commands::Matchday { week, mock_odds } => {
            let week = week
                .or_else(|| current_matchday(&ctx.season))
                .context("season has no fixtures")?;
            let fixtures: Vec<(String, String)> = matchday(&ctx.season, week)
                .into_iter()
                .map(|m| (m.home_team.clone(), m.away_team.clone()))
                .collect();
            info!("📅 Matchday {}: {} fixtures", week, fixtures.len());

            for (home, away) in fixtures {
                let quote = ctx.odds_for(&home, &away, None, false, *mock_odds)?;
                ctx.predict(&home, &away, quote, false)?;
                println!();
            }
        }
        Commands::Ratings { top } => {
            let rankings = ctx.ratings.rankings();
            let shown = top.unwrap_or(rankings.len());
            println!("{:>4}  {:<28} {:>8}", "Rank", "Team", "Rating");
            for entry in rankings.iter().take(shown) {
                println!("{:>4}  {:<28} {:>8.1}", entry.rank, entry.team, entry.rating);
            }
        }
        Commands::Table => {
            let default_xg = ctx.config.engine.defaults.xg_for;
            println!("Bundesliga {}", season_string(season_start_year(ctx.config.season.start_date)));
            println!(
                "{:>4}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4} {:>6} {:>6}",
                "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "xG/m", "xGA/m"
            );
            for row in league_table(&ctx.season) {
                let xg = team_xg_stats(&ctx.season, &row.team, default_xg);
                println!(
                    "{:>4}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4} {:>6.2} {:>6.2}",
                    row.rank,
                    row.team,
                    row.played,
                    row.won,
                    row.drawn,
                    row.lost,
                    row.goals_for,
                    row.goals_against,
                    row.goal_difference,
                    row.points,
                    xg.xg_for_per_match,
                    xg.xg_against_per_match
                );
            }
        }
    }

    Ok(())
}
