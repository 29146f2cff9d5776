use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use super::performance_model::{ReturnData, ReturnMethod};
use crate::constants::{DECIMAL_PRECISION, TRADING_DAYS_PER_YEAR};
use crate::errors::CalculatorError;
use crate::valuation::DailyPortfolioValuation;

const DAYS_PER_YEAR_DECIMAL: Decimal = dec!(365.25);
const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866); // sqrt(252)
const HUNDRED: Decimal = dec!(100);

/// Reconciliation parameters for the return index. Both thresholds are
/// heuristics and deliberately adjustable.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationParams {
    /// Maximum allowed deviation between the rescaled terminal point and
    /// the live return, in percentage points.
    pub tolerance_pct: Decimal,
    /// Terminal index values at or below this cumulative loss are treated
    /// as numerical blow-up.
    pub implausibility_floor_pct: Decimal,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            tolerance_pct: dec!(0.5),
            implausibility_floor_pct: dec!(-99.9),
        }
    }
}

/// Converts the daily value/flow series into a Modified Dietz return index
/// calibrated against the live total return, falling back to a simple
/// cost-basis series when the index cannot be reconciled.
pub struct ReturnIndexCalibrator {
    params: CalibrationParams,
}

impl ReturnIndexCalibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self { params }
    }

    /// Two-stage computation: build the primary index, validate it against
    /// the acceptance predicate, and only then select primary vs. fallback.
    /// `live_return` is a fraction (0.10 = +10%).
    pub fn calibrate(
        &self,
        valuations: &[DailyPortfolioValuation],
        live_return: Decimal,
    ) -> (Vec<ReturnData>, ReturnMethod) {
        match valuations {
            [] => return (Vec::new(), ReturnMethod::NotApplicable),
            [only] => {
                return (
                    vec![ReturnData {
                        date: only.date,
                        value: Decimal::ZERO,
                    }],
                    ReturnMethod::NotApplicable,
                )
            }
            _ => {}
        }

        let index = build_dietz_index(valuations);
        let accepted = index
            .as_deref()
            .and_then(|index| self.acceptance_scale(index, live_return));

        match (index, accepted) {
            (Some(index), Some(scale)) => {
                let mut returns: Vec<ReturnData> = valuations
                    .iter()
                    .zip(index.iter())
                    .map(|(valuation, point)| ReturnData {
                        date: valuation.date,
                        value: ((point * scale - Decimal::ONE) * HUNDRED)
                            .round_dp(DECIMAL_PRECISION),
                    })
                    .collect();
                // Output invariant: the series starts at 0 on the first date.
                returns[0].value = Decimal::ZERO;
                (returns, ReturnMethod::ModifiedDietz)
            }
            _ => {
                let diagnostic = CalculatorError::CalibrationDivergence(format!(
                    "terminal index cannot be reconciled with live return {}",
                    live_return
                ));
                warn!("{}. Falling back to the cost-basis series.", diagnostic);
                (
                    cost_basis_series(valuations, live_return),
                    ReturnMethod::CostBasis,
                )
            }
        }
    }

    /// The rescale factor, or `None` when the index fails the acceptance
    /// predicate and the fallback must be used.
    fn acceptance_scale(&self, index: &[Decimal], live_return: Decimal) -> Option<Decimal> {
        let terminal = *index.last()?;

        let floor_factor = Decimal::ONE + self.params.implausibility_floor_pct / HUNDRED;
        if terminal <= floor_factor {
            return None;
        }

        let live_factor = Decimal::ONE + live_return;
        if live_factor <= Decimal::ZERO {
            return None;
        }

        let scale = live_factor / terminal;
        let rescaled_terminal_pct = (terminal.checked_mul(scale)? - Decimal::ONE) * HUNDRED;
        let deviation = (rescaled_terminal_pct - live_return * HUNDRED).abs();
        if deviation > self.params.tolerance_pct {
            return None;
        }

        Some(scale)
    }
}

/// Accumulates the daily Modified Dietz index: `index(0) = 1`,
/// `index(t) = index(t-1) * (1 + r_t)`. Returns `None` on arithmetic
/// overflow, which the caller treats as calibration divergence.
fn build_dietz_index(valuations: &[DailyPortfolioValuation]) -> Option<Vec<Decimal>> {
    let mut index = Vec::with_capacity(valuations.len());
    let mut cumulative = Decimal::ONE;
    index.push(cumulative);

    for r in daily_dietz_returns(valuations) {
        cumulative = cumulative.checked_mul(Decimal::ONE + r)?;
        index.push(cumulative);
    }

    Some(index)
}

/// Daily Modified Dietz period returns between consecutive valuations:
/// `r = (V1 - V0 - flow) / (V0 + flow/2)` with the flow taken as the
/// inflow occurring exactly on the later date.
pub(crate) fn daily_dietz_returns(valuations: &[DailyPortfolioValuation]) -> Vec<Decimal> {
    let two = dec!(2);
    valuations
        .windows(2)
        .map(|window| {
            let (prev, cur) = (&window[0], &window[1]);
            let flow = cur.net_flow - prev.net_flow;
            let denominator = prev.market_value + flow / two;
            if denominator > Decimal::ZERO {
                (cur.market_value - prev.market_value - flow) / denominator
            } else {
                Decimal::ZERO
            }
        })
        .collect()
}

/// Simple cost-basis fallback: `pct(d) = (MV - capital) / capital * 100`,
/// with the terminal point forced to equal the live return exactly.
fn cost_basis_series(
    valuations: &[DailyPortfolioValuation],
    live_return: Decimal,
) -> Vec<ReturnData> {
    let mut returns: Vec<ReturnData> = valuations
        .iter()
        .map(|valuation| {
            let value = if valuation.capital_deployed > Decimal::ZERO {
                ((valuation.market_value - valuation.capital_deployed)
                    / valuation.capital_deployed
                    * HUNDRED)
                    .round_dp(DECIMAL_PRECISION)
            } else {
                Decimal::ZERO
            };
            ReturnData {
                date: valuation.date,
                value,
            }
        })
        .collect();

    if let Some(last) = returns.last_mut() {
        last.value = (live_return * HUNDRED).round_dp(DECIMAL_PRECISION);
    }
    if let Some(first) = returns.first_mut() {
        first.value = Decimal::ZERO;
    }

    returns
}

/// Annualizes a total return over the period between two dates. Periods
/// shorter than a year are reported as-is.
pub(crate) fn calculate_annualized_return(
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_return: Decimal,
) -> Decimal {
    if start_date > end_date {
        return Decimal::ZERO;
    }

    if total_return <= dec!(-1.0) {
        return dec!(-1.0);
    }

    let days = (end_date - start_date).num_days();
    if days <= 0 {
        return total_return;
    }

    let years = Decimal::from(days) / DAYS_PER_YEAR_DECIMAL;
    if years < Decimal::ONE {
        return total_return;
    }

    let base = Decimal::ONE + total_return;
    if base <= Decimal::ZERO {
        return dec!(-1.0);
    }

    let exponent = Decimal::ONE / years;
    base.powd(exponent) - Decimal::ONE
}

/// Annualized sample standard deviation of daily returns.
pub(crate) fn calculate_volatility(daily_returns: &[Decimal]) -> Decimal {
    if daily_returns.len() < 2 {
        return Decimal::ZERO;
    }

    let count = Decimal::from(daily_returns.len());
    let sum: Decimal = daily_returns.iter().sum();
    let mean = sum / count;

    let sum_squared_diff: Decimal = daily_returns
        .iter()
        .map(|&r| {
            let diff = r - mean;
            diff * diff
        })
        .sum();

    let variance = sum_squared_diff / (count - Decimal::ONE);
    if variance.is_sign_negative() {
        return Decimal::ZERO;
    }

    let daily_volatility = variance.sqrt().unwrap_or(Decimal::ZERO);

    let annualization_factor = Decimal::from(TRADING_DAYS_PER_YEAR)
        .sqrt()
        .unwrap_or(SQRT_TRADING_DAYS_APPROX);

    daily_volatility * annualization_factor
}

/// Maximum drawdown of the compounded daily return path, always >= 0.
pub(crate) fn calculate_max_drawdown(daily_returns: &[Decimal]) -> Decimal {
    if daily_returns.is_empty() {
        return Decimal::ZERO;
    }

    let mut cumulative_value = Decimal::ONE;
    let mut peak_value = Decimal::ONE;
    let mut max_drawdown = Decimal::ZERO;

    for &daily_return in daily_returns {
        cumulative_value *= Decimal::ONE + daily_return;
        peak_value = peak_value.max(cumulative_value);
        if peak_value.is_zero() {
            max_drawdown = max_drawdown.max(Decimal::ONE);
        } else {
            let drawdown = (peak_value - cumulative_value) / peak_value;
            max_drawdown = max_drawdown.max(drawdown);
        }
    }

    max_drawdown.max(Decimal::ZERO)
}
