use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of a cumulative return series, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnData {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Attribution method behind a return series. Modified Dietz is the
/// documented primary method; the cost-basis series is the calibration
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReturnMethod {
    #[default]
    ModifiedDietz,
    CostBasis,
    NotApplicable,
}

/// The calibrated return series with its summary metrics, as handed to the
/// dashboard layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSeries {
    pub returns: Vec<ReturnData>,
    pub method: ReturnMethod,
    /// Reporting currency all amounts were converted into.
    pub currency: String,
    pub period_start_date: Option<NaiveDate>,
    pub period_end_date: Option<NaiveDate>,
    /// Independently computed live total return, percentage points.
    pub live_return_pct: Decimal,
    pub cumulative_return_pct: Decimal,
    pub annualized_return_pct: Decimal,
    pub volatility: Decimal,
    pub max_drawdown: Decimal,
}

impl PerformanceSeries {
    /// Periodic returns implied by the cumulative series, as plain floats
    /// for the statistical battery.
    pub fn periodic_returns(&self) -> Vec<f64> {
        self.returns
            .windows(2)
            .filter_map(|window| {
                let prev =
                    (Decimal::ONE + window[0].value / Decimal::ONE_HUNDRED).to_f64()?;
                let cur =
                    (Decimal::ONE + window[1].value / Decimal::ONE_HUNDRED).to_f64()?;
                if prev.abs() < f64::EPSILON {
                    None
                } else {
                    Some(cur / prev - 1.0)
                }
            })
            .collect()
    }

    pub fn empty() -> Self {
        Self {
            returns: Vec::new(),
            method: ReturnMethod::NotApplicable,
            currency: String::new(),
            period_start_date: None,
            period_end_date: None,
            live_return_pct: Decimal::ZERO,
            cumulative_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            volatility: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
        }
    }
}
