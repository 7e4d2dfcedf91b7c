use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::error::{PredictError, Result};

/// Three-way match-winner prices in decimal (European) format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecimalOdds {
    pub home_win: Decimal,
    pub draw: Decimal,
    pub away_win: Decimal,
}

impl DecimalOdds {
    pub fn new(home_win: Decimal, draw: Decimal, away_win: Decimal) -> Self {
        Self { home_win, draw, away_win }
    }

    /// Prices as floats; anything unrepresentable becomes 0.0, which downstream
    /// conversion treats as "no information".
    pub fn as_f64(&self) -> (f64, f64, f64) {
        (
            self.home_win.to_f64().unwrap_or(0.0),
            self.draw.to_f64().unwrap_or(0.0),
            self.away_win.to_f64().unwrap_or(0.0),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OddsFormat {
    Decimal { home: Decimal, draw: Decimal, away: Decimal },
    American { home: i32, draw: i32, away: i32 },
    Fractional { home: String, draw: String, away: String },
}

impl OddsFormat {
    pub fn to_decimal(&self) -> Result<DecimalOdds> {
        match self {
            OddsFormat::Decimal { home, draw, away } => Ok(DecimalOdds::new(*home, *draw, *away)),
            OddsFormat::American { home, draw, away } => Ok(DecimalOdds::new(
                american_to_decimal(*home)?,
                american_to_decimal(*draw)?,
                american_to_decimal(*away)?,
            )),
            OddsFormat::Fractional { home, draw, away } => Ok(DecimalOdds::new(
                fractional_to_decimal(home)?,
                fractional_to_decimal(draw)?,
                fractional_to_decimal(away)?,
            )),
        }
    }
}

/// How the bookmaker overround is taken out of implied probabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarginMethod {
    /// Rescale the triple so it sums to 1.
    #[default]
    Proportional,
    /// Exchange prices carry no bookmaker margin; use them unchanged.
    AsIs,
}

/// A price triple as delivered by an odds collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OddsQuote {
    pub odds: DecimalOdds,
    pub margin_method: MarginMethod,
    pub source: String,
}

impl OddsQuote {
    pub fn bookmaker(odds: DecimalOdds, source: impl Into<String>) -> Self {
        Self { odds, margin_method: MarginMethod::Proportional, source: source.into() }
    }

    pub fn exchange(odds: DecimalOdds, source: impl Into<String>) -> Self {
        Self { odds, margin_method: MarginMethod::AsIs, source: source.into() }
    }
}

pub fn american_to_decimal(american: i32) -> Result<Decimal> {
    if american == 0 {
        return Err(PredictError::InvalidOdds("American odds cannot be zero".to_string()));
    }

    let decimal = if american > 0 {
        Decimal::from(american) / Decimal::from(100) + Decimal::ONE
    } else {
        Decimal::from(100) / Decimal::from(-american) + Decimal::ONE
    };

    Ok(decimal)
}

pub fn fractional_to_decimal(fractional: &str) -> Result<Decimal> {
    let parts: Vec<&str> = fractional.trim().split('/').collect();
    if parts.len() != 2 {
        return Err(PredictError::InvalidOdds(format!("Invalid fractional odds format: {}", fractional)));
    }

    let numerator: i32 = parts[0].trim().parse()
        .map_err(|_| PredictError::InvalidOdds(format!("Invalid numerator: {}", parts[0])))?;
    let denominator: i32 = parts[1].trim().parse()
        .map_err(|_| PredictError::InvalidOdds(format!("Invalid denominator: {}", parts[1])))?;

    if denominator == 0 {
        return Err(PredictError::InvalidOdds("Denominator cannot be zero".to_string()));
    }

    Ok(Decimal::from(numerator) / Decimal::from(denominator) + Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_odds_conversion() {
        let odds = OddsFormat::Decimal {
            home: dec!(2.5),
            draw: dec!(3.2),
            away: dec!(2.8),
        };

        let converted = odds.to_decimal().unwrap();
        assert_eq!(converted.home_win, dec!(2.5));
        assert_eq!(converted.draw, dec!(3.2));
        assert_eq!(converted.away_win, dec!(2.8));
    }

    #[test]
    fn test_american_to_decimal() {
        assert_eq!(american_to_decimal(100).unwrap(), dec!(2.0));
        assert_eq!(american_to_decimal(-100).unwrap(), dec!(2.0));
        assert_eq!(american_to_decimal(200).unwrap(), dec!(3.0));
        assert_eq!(american_to_decimal(-200).unwrap(), dec!(1.5));
        assert!(american_to_decimal(0).is_err());
    }

    #[test]
    fn test_fractional_to_decimal() {
        assert_eq!(fractional_to_decimal("1/1").unwrap(), dec!(2.0));
        assert_eq!(fractional_to_decimal("2/1").unwrap(), dec!(3.0));
        assert_eq!(fractional_to_decimal("1/2").unwrap(), dec!(1.5));
        assert!(fractional_to_decimal("5").is_err());
        assert!(fractional_to_decimal("5/0").is_err());
    }
}
