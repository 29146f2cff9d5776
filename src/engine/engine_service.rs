use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::engine_config::EngineConfig;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Error, Result, ValidationError};
use crate::market_data::{
    FixedIncomeValuerTrait, MarketDataProviderTrait, SeriesFetchCoordinator,
};
use crate::performance::return_calibrator::{
    calculate_annualized_return, calculate_max_drawdown, calculate_volatility,
    daily_dietz_returns,
};
use crate::performance::{PerformanceSeries, ReturnIndexCalibrator};
use crate::positions::{Instrument, Position, PositionResolver, ResolvedPosition};
use crate::rebalancing::{RebalanceConstraints, RebalancingRecommendation};
use crate::risk::{
    CorrelationMatrix, RiskMetricsSnapshot, StressScenarioResult, StressTestInputs,
    StressTestSummary,
};
use crate::valuation::{reconstruct, ReconstructionInputs, TradingCalendar};

/// Facade over the whole analytics pipeline. Invoked on demand by the
/// dashboard layer; holds no cross-query mutable state beyond the fetch
/// generation counter.
pub struct AnalyticsEngine {
    coordinator: SeriesFetchCoordinator,
    resolver: PositionResolver,
    calibrator: ReturnIndexCalibrator,
    config: EngineConfig,
}

impl AnalyticsEngine {
    pub fn new(
        market_data: Arc<dyn MarketDataProviderTrait>,
        fi_valuer: Arc<dyn FixedIncomeValuerTrait>,
        config: EngineConfig,
    ) -> Self {
        let coordinator = SeriesFetchCoordinator::new(
            market_data,
            fi_valuer,
            config.fx_symbol.clone(),
            config.fetch_concurrency,
        );
        let resolver = PositionResolver::new(config.local_market_suffix.clone());
        let calibrator = ReturnIndexCalibrator::new(config.calibration.clone());
        Self {
            coordinator,
            resolver,
            calibrator,
            config,
        }
    }

    /// Reconstructs the calibrated cumulative return series for the given
    /// holdings over the requested period.
    pub async fn compute_performance_series(
        &self,
        positions: &[Position],
        period: &str,
    ) -> Result<PerformanceSeries> {
        self.compute_performance_series_as_of(positions, period, Utc::now().date_naive())
            .await
    }

    /// Same as [`compute_performance_series`] with an explicit "today",
    /// which keeps the computation a pure function of its inputs.
    ///
    /// [`compute_performance_series`]: Self::compute_performance_series
    pub async fn compute_performance_series_as_of(
        &self,
        positions: &[Position],
        period: &str,
        today: NaiveDate,
    ) -> Result<PerformanceSeries> {
        if positions.is_empty() {
            return Err(Error::Validation(ValidationError::InsufficientData(
                "no positions to analyze".to_string(),
            )));
        }
        for position in positions {
            position.validate()?;
        }

        let generation = self.coordinator.begin_query();

        let mut symbols: Vec<String> = positions
            .iter()
            .filter_map(|p| p.instrument.symbol().map(str::to_string))
            .collect();
        symbols.sort();
        symbols.dedup();

        let fi_start = positions
            .iter()
            .filter_map(|p| p.purchase_date)
            .min()
            .unwrap_or(today);
        let fi_requests: Vec<(String, NaiveDate, NaiveDate)> = positions
            .iter()
            .filter_map(|p| match &p.instrument {
                Instrument::FixedIncome { position_id } => {
                    Some((position_id.clone(), fi_start, today))
                }
                Instrument::Equity { .. } => None,
            })
            .collect();

        let mut bundle = self
            .coordinator
            .fetch_bundle(generation, &symbols, &fi_requests, period, &self.config.interval)
            .await?;

        if bundle.fx.is_empty() {
            return Err(Error::Validation(ValidationError::InsufficientData(
                "no FX history available".to_string(),
            )));
        }

        let mut calendar = TradingCalendar::from_fx_series(&mut bundle.fx, today);
        let resolved = self
            .resolver
            .resolve(positions, &calendar, &bundle.prices)?;

        // The return series begins exactly at first capital deployment.
        if let Some(min_start) = resolved.iter().map(|r| r.effective_start).min() {
            calendar.trim_start_to(min_start);
        }

        let valuations = reconstruct(&ReconstructionInputs {
            calendar: &calendar,
            positions: &resolved,
            prices: &bundle.prices,
            fx: &bundle.fx,
            fi_series: &bundle.fi_series,
            anchor_fx_rate: bundle.live_fx_rate,
            lookback_entries: self.config.price_lookback_entries,
        })?;

        let live_return = live_total_return(&resolved, bundle.live_fx_rate)?;
        debug!(
            "Calibrating {} valuation points against live return {}",
            valuations.len(),
            live_return
        );

        let (returns, method) = self.calibrator.calibrate(&valuations, live_return);

        let period_start_date = returns.first().map(|r| r.date);
        let period_end_date = returns.last().map(|r| r.date);
        let cumulative_return_pct = returns.last().map_or(Decimal::ZERO, |r| r.value);

        let annualized_return_pct = match (period_start_date, period_end_date) {
            (Some(start), Some(end)) => {
                calculate_annualized_return(start, end, cumulative_return_pct / Decimal::ONE_HUNDRED)
                    * Decimal::ONE_HUNDRED
            }
            _ => Decimal::ZERO,
        };

        let daily_returns = daily_dietz_returns(&valuations);
        let volatility = calculate_volatility(&daily_returns);
        let max_drawdown = calculate_max_drawdown(&daily_returns);

        Ok(PerformanceSeries {
            returns,
            method,
            currency: self.config.reporting_currency.clone(),
            period_start_date,
            period_end_date,
            live_return_pct: (live_return * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION),
            cumulative_return_pct,
            annualized_return_pct: annualized_return_pct.round_dp(DECIMAL_PRECISION),
            volatility: volatility.round_dp(DECIMAL_PRECISION),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
        })
    }

    /// Scalar risk metrics over periodic returns and a per-period
    /// risk-free rate.
    pub fn compute_risk_metrics(
        &self,
        returns: &[f64],
        risk_free_rate: f64,
    ) -> RiskMetricsSnapshot {
        crate::risk::compute_risk_metrics(returns, risk_free_rate)
    }

    /// Pairwise correlation across per-asset return series.
    pub fn compute_correlation_matrix(
        &self,
        returns_by_asset: &BTreeMap<String, Vec<f64>>,
    ) -> Result<CorrelationMatrix> {
        crate::risk::correlation_matrix(returns_by_asset)
    }

    /// Monte Carlo stress simulation. A zero `n_simulations` uses the
    /// configured default.
    pub fn run_stress_test(
        &self,
        weights: &[f64],
        volatilities: &[f64],
        correlations: &CorrelationMatrix,
        expected_returns: &[f64],
        n_simulations: usize,
    ) -> Result<StressTestSummary> {
        let n_simulations = if n_simulations == 0 {
            self.config.n_simulations
        } else {
            n_simulations
        };
        crate::risk::run_stress_test(&StressTestInputs {
            weights,
            volatilities,
            expected_returns,
            correlations,
            n_simulations,
            seed: self.config.simulation_seed,
        })
    }

    /// Fixed-impact historical scenarios applied to the current value.
    pub fn run_historical_scenarios(&self, portfolio_value: f64) -> Vec<StressScenarioResult> {
        crate::risk::historical_scenarios()
            .iter()
            .map(|scenario| crate::risk::apply_scenario(scenario, portfolio_value))
            .collect()
    }

    /// Buy/sell/hold advice from current vs. target weights under the
    /// given constraints.
    pub fn generate_rebalancing_recommendations(
        &self,
        current_weights: &BTreeMap<String, f64>,
        target_weights: &BTreeMap<String, f64>,
        constraints: &RebalanceConstraints,
    ) -> Result<Vec<RebalancingRecommendation>> {
        crate::rebalancing::generate_recommendations(
            current_weights,
            target_weights,
            constraints,
            self.config.rebalance_epsilon,
        )
    }

    /// Portfolio weights from current market values, foreign legs
    /// converted at the supplied live FX rate.
    pub fn current_weights(
        &self,
        positions: &[Position],
        live_fx_rate: Decimal,
    ) -> BTreeMap<String, f64> {
        let values: Vec<(String, Decimal)> = positions
            .iter()
            .map(|position| {
                let rate = match self.resolver.classify_currency(&position.instrument) {
                    crate::positions::CurrencyClass::Foreign => live_fx_rate,
                    crate::positions::CurrencyClass::Local => Decimal::ONE,
                };
                (
                    position.instrument.reference().to_string(),
                    position.current_value() * rate,
                )
            })
            .collect();

        let total: Decimal = values.iter().map(|(_, v)| *v).sum();
        if total <= Decimal::ZERO {
            return BTreeMap::new();
        }

        values
            .into_iter()
            .map(|(reference, value)| {
                (reference, (value / total).to_f64().unwrap_or(0.0))
            })
            .collect()
    }
}

/// Live total return of the portfolio: current market value against
/// deployed capital, all foreign legs converted at the live FX rate.
fn live_total_return(resolved: &[ResolvedPosition], live_fx_rate: Decimal) -> Result<Decimal> {
    let mut market_value = Decimal::ZERO;
    let mut capital = Decimal::ZERO;

    for position in resolved {
        let rate = if position.is_foreign() {
            live_fx_rate
        } else {
            Decimal::ONE
        };
        market_value += position.position.current_value() * rate;
        capital += position.position.cost() * rate;
    }

    if capital <= Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InsufficientData(
            "no deployed capital".to_string(),
        )));
    }

    Ok((market_value - capital) / capital)
}
