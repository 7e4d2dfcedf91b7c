//! Factor collection for one team.
//!
//! A [`FactorProvider`] answers per-team questions (xG, squad value, injuries,
//! odds) and may have nothing to say about any of them. [`FactorService`] turns
//! those answers into a fresh [`FactorSnapshot`], reading the slow-moving
//! factors through the cache.

use std::sync::Arc;

use tipster_ml::RatingSystem;
use tipster_models::{FactorSnapshot, OddsQuote, Result};
use tracing::debug;

use crate::cache::{get_typed, set_typed, Cache};

#[cfg_attr(test, mockall::automock)]
pub trait FactorProvider: Send + Sync {
    /// Canonical team name for a user query, or `TeamNotFound`.
    fn resolve_team(&self, query: &str) -> Result<String>;
    /// Average xG created and conceded per match.
    fn xg(&self, team: &str) -> Option<(f64, f64)>;
    fn squad_value(&self, team: &str) -> Option<f64>;
    fn injured_count(&self, team: &str) -> Option<u32>;
    fn odds(&self, home: &str, away: &str) -> Option<OddsQuote>;
    /// Provenance tag shown in reports.
    fn source(&self) -> Option<String>;
}

pub struct FactorService<P> {
    provider: P,
    cache: Arc<dyn Cache>,
}

impl<P: FactorProvider> FactorService<P> {
    pub fn new(provider: P, cache: Arc<dyn Cache>) -> Self {
        Self { provider, cache }
    }

    pub fn resolve_team(&self, query: &str) -> Result<String> {
        self.provider.resolve_team(query)
    }

    /// Builds the snapshot for one team. Missing factors stay `None`; defaults
    /// are the engine's business.
    pub fn snapshot(&self, query: &str, ratings: &RatingSystem) -> Result<FactorSnapshot> {
        let team = self.provider.resolve_team(query)?;
        let mut snapshot = FactorSnapshot::new(team.clone(), ratings.get_rating(&team));

        if let Some((xg_for, xg_against)) = self.provider.xg(&team) {
            snapshot = snapshot.with_xg(xg_for, xg_against);
        }
        snapshot.squad_value = self.read_through(&format!("value_{}", team), || self.provider.squad_value(&team));
        snapshot.injured_count = self.read_through(&format!("injuries_{}", team), || self.provider.injured_count(&team));
        snapshot.source = self.provider.source();

        Ok(snapshot)
    }

    pub fn odds(&self, home: &str, away: &str) -> Option<OddsQuote> {
        self.read_through(&format!("odds_{}_{}", home, away), || self.provider.odds(home, away))
    }

    fn read_through<T, F>(&self, key: &str, fetch: F) -> Option<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> Option<T>,
    {
        if let Some(cached) = get_typed(self.cache.as_ref(), key) {
            return Some(cached);
        }
        debug!("Cache miss: {}", key);
        let fresh = fetch()?;
        set_typed(self.cache.as_ref(), key, &fresh);
        Some(fresh)
    }
}
