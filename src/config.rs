use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use tipster_ml::RatingConfig;
use tipster_services::{CacheConfig, EngineConfig, MockSeasonConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rating: RatingConfig,
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub season: SeasonConfig,
    pub logging: LoggingConfig,
}

/// Mock season fed to the demo commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub played_matchdays: u32,
    pub upcoming_matchdays: u32,
    pub start_date: NaiveDate,
    pub seed: u64,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        let mock = MockSeasonConfig::default();
        Self {
            played_matchdays: mock.played_matchdays,
            upcoming_matchdays: mock.upcoming_matchdays,
            start_date: mock.start_date,
            seed: mock.seed,
        }
    }
}

impl From<&SeasonConfig> for MockSeasonConfig {
    fn from(season: &SeasonConfig) -> Self {
        Self {
            played_matchdays: season.played_matchdays,
            upcoming_matchdays: season.upcoming_matchdays,
            start_date: season.start_date,
            seed: season.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "tipster=info".to_string() }
    }
}

impl AppConfig {
    /// Built-in defaults, then `config/default`, `config/{RUN_MODE}` and
    /// `config/local`, then `TIPSTER_*` environment variables
    /// (`TIPSTER_ENGINE__ODDS_MODE=calibration`).
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .set_default("rating.k_factor", 32.0)?
            .set_default("rating.home_advantage", 100.0)?
            .set_default("rating.base_rating", 1500.0)?
            .set_default("cache.enabled", true)?
            .set_default("cache.default_ttl_hours", 24)?
            .set_default("logging.filter", "tipster=info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("TIPSTER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Weight sums and engine bounds are checked before anything runs.
    pub fn validate(&self) -> tipster_models::Result<()> {
        self.engine.validate()?;
        if !(self.rating.k_factor > 0.0) {
            return Err(tipster_models::PredictError::Config(format!(
                "rating.k_factor must be positive, got {}",
                self.rating.k_factor
            )));
        }
        Ok(())
    }
}
