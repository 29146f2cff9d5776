use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceAction {
    Buy,
    Sell,
    Hold,
}

/// Policy constraints the advisor references when motivating a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceConstraints {
    /// Risk profile label, e.g. "conservative", "balanced", "aggressive".
    pub risk_profile: String,
    /// Maximum allowed annualized portfolio volatility, as a fraction.
    pub max_volatility: Option<f64>,
    /// Target annual return, as a fraction.
    pub target_return: Option<f64>,
}

impl RebalanceConstraints {
    pub fn validate(&self) -> Result<()> {
        if self.risk_profile.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Risk profile cannot be empty".to_string(),
            )));
        }
        if let Some(max_volatility) = self.max_volatility {
            if !max_volatility.is_finite() || max_volatility < 0.0 {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Max volatility must be a non-negative number".to_string(),
                )));
            }
        }
        if let Some(target_return) = self.target_return {
            if !target_return.is_finite() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Target return must be finite".to_string(),
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingRecommendation {
    pub instrument_ref: String,
    pub current_weight: f64,
    pub target_weight: f64,
    pub action: RebalanceAction,
    /// Magnitude of the adjustment, in percentage points of the portfolio.
    pub amount_pct: f64,
    pub rationale: String,
}
