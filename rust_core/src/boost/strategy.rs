//! Compiled-in registry of odds boost strategies.
//!
//! Boost rows in the catalog reference strategies by name; the registry is
//! the single source of truth for what those names mean numerically.

use crate::error::PublishError;
use crate::models::OddsChangeMarket;

/// Lowest odds a boosted outcome may carry.
const MIN_ODDS: f64 = 1.0;

/// A named numeric transformation of market odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostStrategy {
    /// Each outcome's odds grow by `percent` of their value:
    /// `odds * (1 + percent / 100)`.
    AdditivePercent,
    /// The profit component of each outcome grows by `percent`:
    /// `1 + (odds - 1) * (1 + percent / 100)`.
    MultiplicativePercent,
}

impl BoostStrategy {
    /// Resolve a catalog strategy name.
    pub fn from_name(name: &str) -> Result<Self, PublishError> {
        match name {
            "ADDITIVE_PERCENT" => Ok(Self::AdditivePercent),
            "MULTIPLICATIVE_PERCENT" => Ok(Self::MultiplicativePercent),
            _ => Err(PublishError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AdditivePercent => "ADDITIVE_PERCENT",
            Self::MultiplicativePercent => "MULTIPLICATIVE_PERCENT",
        }
    }

    /// Transform every outcome's odds of `market` in place.
    ///
    /// Rounding and the minimum-odds floor live here; callers pass markets
    /// through unchanged.
    pub fn apply(&self, market: &mut OddsChangeMarket, percent: f64) {
        for outcome in &mut market.outcomes {
            let boosted = match self {
                Self::AdditivePercent => outcome.odds * (1.0 + percent / 100.0),
                Self::MultiplicativePercent => 1.0 + (outcome.odds - 1.0) * (1.0 + percent / 100.0),
            };
            outcome.odds = round_odds(boosted.max(MIN_ODDS));
        }
    }
}

/// Odds are quoted to three decimal places.
fn round_odds(odds: f64) -> f64 {
    (odds * 1000.0).round() / 1000.0
}
