use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::calendar::TradingCalendar;
use super::unit_price::{resolve_unit_price, PriceContext};
use super::valuation_model::DailyPortfolioValuation;
use crate::errors::Result;
use crate::market_data::{FiValuationSeries, FxSeries, PriceSeries};
use crate::positions::{Instrument, ResolvedPosition};

pub struct ReconstructionInputs<'a> {
    pub calendar: &'a TradingCalendar,
    pub positions: &'a [ResolvedPosition],
    pub prices: &'a HashMap<String, PriceSeries>,
    pub fx: &'a FxSeries,
    pub fi_series: &'a HashMap<String, FiValuationSeries>,
    /// Live FX rate fixed at query time; the conversion anchor for the
    /// capital-deployed baseline.
    pub anchor_fx_rate: Decimal,
    pub lookback_entries: usize,
}

/// Reconstructs the daily portfolio valuation over the calendar: market
/// value, anchor-converted capital deployed, and point-in-time net flows.
///
/// Leading dates with no deployed capital are dropped, so the resulting
/// series begins exactly at first capital deployment.
pub fn reconstruct(inputs: &ReconstructionInputs) -> Result<Vec<DailyPortfolioValuation>> {
    let mut valuations = Vec::with_capacity(inputs.calendar.len());

    // Carried unit value per position, in the instrument's own currency.
    let mut last_units: Vec<Option<Decimal>> = vec![None; inputs.positions.len()];

    let mut capital_deployed = Decimal::ZERO;
    let mut net_flow = Decimal::ZERO;

    for date in inputs.calendar.iter() {
        for resolved in inputs.positions {
            if resolved.effective_start == date {
                capital_deployed += position_cost(resolved, inputs.anchor_fx_rate);
                let entry_rate = fx_rate_for(inputs.fx, date, inputs.anchor_fx_rate);
                net_flow += position_cost(resolved, entry_rate);
            }
        }

        let mut market_value = Decimal::ZERO;
        for (idx, resolved) in inputs.positions.iter().enumerate() {
            if !resolved.is_active_on(date) {
                continue;
            }

            let unit = match &resolved.position.instrument {
                Instrument::Equity { symbol } => {
                    let ctx = PriceContext {
                        series: inputs.prices.get(symbol),
                        scale: resolved.price_scale,
                        purchase_price: resolved.position.unit_cost,
                        effective_start: resolved.effective_start,
                        calendar: inputs.calendar,
                        lookback_entries: inputs.lookback_entries,
                    };
                    resolve_unit_price(&ctx, date).or(last_units[idx])
                }
                Instrument::FixedIncome { position_id } => inputs
                    .fi_series
                    .get(position_id)
                    .and_then(|series| series.dirty_price_at_or_before(date))
                    .or(last_units[idx])
                    .or_else(|| {
                        (date == resolved.effective_start).then_some(resolved.position.unit_cost)
                    }),
            };

            match unit {
                Some(unit) => {
                    last_units[idx] = Some(unit);
                    let rate = if resolved.is_foreign() {
                        fx_rate_for(inputs.fx, date, inputs.anchor_fx_rate)
                    } else {
                        Decimal::ONE
                    };
                    market_value += resolved.position.quantity * unit * rate;
                }
                None => {
                    debug!(
                        "No unit value for position {} on {}. Contribution treated as ZERO.",
                        resolved.position.id, date
                    );
                }
            }
        }

        valuations.push(DailyPortfolioValuation {
            date,
            market_value,
            capital_deployed,
            net_flow,
        });
    }

    // The series must begin at first capital deployment.
    let first_deployed = valuations
        .iter()
        .position(|v| !v.capital_deployed.is_zero())
        .unwrap_or(valuations.len());
    valuations.drain(..first_deployed);

    Ok(valuations)
}

fn position_cost(resolved: &ResolvedPosition, fx_rate: Decimal) -> Decimal {
    let cost = resolved.position.cost();
    if resolved.is_foreign() {
        cost * fx_rate
    } else {
        cost
    }
}

/// Carry-forward FX lookup; before the series starts it back-fills with the
/// first available rate, and an entirely empty series degrades to the
/// anchor rate.
fn fx_rate_for(fx: &FxSeries, date: NaiveDate, anchor: Decimal) -> Decimal {
    fx.rate_at_or_before(date)
        .or_else(|| fx.dates().next().and_then(|first| fx.get(first)))
        .unwrap_or(anchor)
}
