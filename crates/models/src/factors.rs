//! Per-team inputs to a prediction and the strength pairs derived from them.
//!
//! A [`FactorSnapshot`] is built fresh for every prediction. Each optional
//! field is `None` when the upstream collaborator had nothing to offer; the
//! engine resolves it against [`FactorDefaults`] and keeps track of which
//! values were defaulted so the report can show it.

use serde::{Deserialize, Serialize};

/// Values substituted when a collaborator returns nothing for a team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FactorDefaults {
    pub xg_for: f64,
    pub xg_against: f64,
    pub squad_value: f64,
    pub injured_count: u32,
}

impl Default for FactorDefaults {
    fn default() -> Self {
        Self {
            xg_for: 1.5,
            xg_against: 1.5,
            squad_value: 100_000_000.0,
            injured_count: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorSnapshot {
    /// Canonical display name after name resolution.
    pub team: String,
    pub rating: f64,
    pub xg_for: Option<f64>,
    pub xg_against: Option<f64>,
    pub squad_value: Option<f64>,
    pub injured_count: Option<u32>,
    /// Free-form provenance tag, passed through to the report untouched.
    pub source: Option<String>,
}

impl FactorSnapshot {
    pub fn new(team: impl Into<String>, rating: f64) -> Self {
        Self {
            team: team.into(),
            rating,
            xg_for: None,
            xg_against: None,
            squad_value: None,
            injured_count: None,
            source: None,
        }
    }

    pub fn with_xg(mut self, xg_for: f64, xg_against: f64) -> Self {
        self.xg_for = Some(xg_for);
        self.xg_against = Some(xg_against);
        self
    }

    pub fn with_squad_value(mut self, squad_value: f64) -> Self {
        self.squad_value = Some(squad_value);
        self
    }

    pub fn with_injuries(mut self, injured_count: u32) -> Self {
        self.injured_count = Some(injured_count);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn resolve(&self, defaults: &FactorDefaults) -> ResolvedFactors {
        ResolvedFactors {
            team: self.team.clone(),
            rating: self.rating,
            xg_for: Resolved::or_default(self.xg_for.filter(|v| v.is_finite() && *v >= 0.0), defaults.xg_for),
            xg_against: Resolved::or_default(
                self.xg_against.filter(|v| v.is_finite() && *v >= 0.0),
                defaults.xg_against,
            ),
            squad_value: Resolved::or_default(
                self.squad_value.filter(|v| v.is_finite() && *v >= 0.0),
                defaults.squad_value,
            ),
            injured_count: Resolved::or_default(self.injured_count, defaults.injured_count),
            source: self.source.clone(),
        }
    }
}

/// A value together with whether it came from the defaults table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Resolved<T> {
    pub fn or_default(value: Option<T>, default: T) -> Self {
        match value {
            Some(value) => Self { value, defaulted: false },
            None => Self { value: default, defaulted: true },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedFactors {
    pub team: String,
    pub rating: f64,
    pub xg_for: Resolved<f64>,
    pub xg_against: Resolved<f64>,
    pub squad_value: Resolved<f64>,
    pub injured_count: Resolved<u32>,
    pub source: Option<String>,
}

impl ResolvedFactors {
    pub fn used_fallback(&self) -> bool {
        self.xg_for.defaulted
            || self.xg_against.defaulted
            || self.squad_value.defaulted
            || self.injured_count.defaulted
    }

    /// Names of the factors that fell back to defaults, for display.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.xg_for.defaulted {
            fields.push("xg_for");
        }
        if self.xg_against.defaulted {
            fields.push("xg_against");
        }
        if self.squad_value.defaulted {
            fields.push("squad_value");
        }
        if self.injured_count.defaulted {
            fields.push("injured_count");
        }
        fields
    }
}

/// Relative strength of the two sides; `home + away == 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrengthPair {
    pub home: f64,
    pub away: f64,
}

impl StrengthPair {
    pub const EVEN: StrengthPair = StrengthPair { home: 0.5, away: 0.5 };

    /// Normalizes two non-negative scores into a pair. Falls back to 50/50 when
    /// the scores carry no information.
    pub fn normalized(home: f64, away: f64) -> Self {
        let total = home + away;
        if !total.is_finite() || total <= 0.0 || home < 0.0 || away < 0.0 {
            return Self::EVEN;
        }
        Self { home: home / total, away: away / total }
    }

    pub fn from_home(home: f64) -> Self {
        let home = home.clamp(0.0, 1.0);
        Self { home, away: 1.0 - home }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.away
    }
}

/// Independent per-side multipliers in `[0, max_impact]`. Not a strength pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct InjuryPenalty {
    pub home: f64,
    pub away: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_marks_defaults() {
        let snapshot = FactorSnapshot::new("Bayern München", 1900.0).with_squad_value(850_000_000.0);
        let resolved = snapshot.resolve(&FactorDefaults::default());

        assert_eq!(resolved.squad_value.value, 850_000_000.0);
        assert!(!resolved.squad_value.defaulted);
        assert_eq!(resolved.xg_for.value, 1.5);
        assert!(resolved.xg_for.defaulted);
        assert_eq!(resolved.injured_count.value, 2);
        assert!(resolved.used_fallback());
        assert_eq!(resolved.defaulted_fields(), vec!["xg_for", "xg_against", "injured_count"]);
    }

    #[test]
    fn test_resolve_rejects_negative_values() {
        let snapshot = FactorSnapshot::new("A", 1500.0).with_xg(-1.0, 1.2).with_squad_value(f64::NAN);
        let resolved = snapshot.resolve(&FactorDefaults::default());

        assert!(resolved.xg_for.defaulted);
        assert!(!resolved.xg_against.defaulted);
        assert!(resolved.squad_value.defaulted);
    }

    #[test]
    fn test_fully_populated_snapshot() {
        let snapshot = FactorSnapshot::new("A", 1500.0)
            .with_xg(1.8, 1.1)
            .with_squad_value(2.0e8)
            .with_injuries(0)
            .with_source("transfermarkt");
        let resolved = snapshot.resolve(&FactorDefaults::default());

        assert!(!resolved.used_fallback());
        assert_eq!(resolved.source.as_deref(), Some("transfermarkt"));
    }

    #[test]
    fn test_strength_pair_normalization() {
        let pair = StrengthPair::normalized(3.0, 1.0);
        assert!((pair.home - 0.75).abs() < 1e-12);
        assert!((pair.sum() - 1.0).abs() < 1e-12);

        assert_eq!(StrengthPair::normalized(0.0, 0.0), StrengthPair::EVEN);
        assert_eq!(StrengthPair::normalized(f64::INFINITY, 1.0), StrengthPair::EVEN);
        assert_eq!(StrengthPair::from_home(1.4), StrengthPair { home: 1.0, away: 0.0 });
    }
}
