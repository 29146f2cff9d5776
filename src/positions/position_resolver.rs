use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::position_model::{CurrencyClass, Instrument, Position, ResolvedPosition};
use crate::errors::{Error, Result, ValidationError};
use crate::market_data::PriceSeries;
use crate::valuation::TradingCalendar;

/// Resolves raw positions into their effective start date, currency class
/// and adjusted-price rescale factor.
pub struct PositionResolver {
    local_market_suffix: String,
}

impl PositionResolver {
    pub fn new(local_market_suffix: impl Into<String>) -> Self {
        Self {
            local_market_suffix: local_market_suffix.into(),
        }
    }

    /// A position trades in the local market when it has no symbol at all
    /// (fixed income is valued locally) or its symbol carries the local
    /// exchange suffix.
    pub fn classify_currency(&self, instrument: &Instrument) -> CurrencyClass {
        match instrument.symbol() {
            None => CurrencyClass::Local,
            Some(symbol) if symbol.ends_with(&self.local_market_suffix) => CurrencyClass::Local,
            Some(_) => CurrencyClass::Foreign,
        }
    }

    pub fn resolve(
        &self,
        positions: &[Position],
        calendar: &TradingCalendar,
        prices: &HashMap<String, PriceSeries>,
    ) -> Result<Vec<ResolvedPosition>> {
        if positions.is_empty() {
            return Err(Error::Validation(ValidationError::InsufficientData(
                "no positions to analyze".to_string(),
            )));
        }
        let first_date = calendar.first().ok_or_else(|| {
            Error::Validation(ValidationError::InsufficientData(
                "empty trading calendar".to_string(),
            ))
        })?;
        let last_date = calendar.last().unwrap_or(first_date);

        for position in positions {
            position.validate()?;
        }

        // Positions without a recorded purchase date inherit the earliest
        // known purchase across the portfolio.
        let earliest_purchase: Option<NaiveDate> =
            positions.iter().filter_map(|p| p.purchase_date).min();

        let resolved = positions
            .iter()
            .map(|position| {
                let anchor = position
                    .purchase_date
                    .or(earliest_purchase)
                    .unwrap_or(first_date);

                // Clamp: the calendar is never extended backward for
                // positions older than the FX history.
                let effective_start = calendar.first_at_or_after(anchor).unwrap_or(last_date);

                let currency_class = self.classify_currency(&position.instrument);
                let price_scale =
                    self.compute_price_scale(position, effective_start, prices);

                ResolvedPosition {
                    position: position.clone(),
                    effective_start,
                    currency_class,
                    price_scale,
                }
            })
            .collect();

        Ok(resolved)
    }

    /// Aligns the externally sourced adjusted-price series with the
    /// position's recorded purchase price on its effective start date.
    /// Returns `None` when no reference price exists, in which case raw
    /// prices are used unscaled.
    fn compute_price_scale(
        &self,
        position: &Position,
        effective_start: NaiveDate,
        prices: &HashMap<String, PriceSeries>,
    ) -> Option<Decimal> {
        let symbol = position.instrument.symbol()?;
        let series = prices.get(symbol)?;
        let (reference_date, reference_price) = series.at_or_after(effective_start)?;

        if reference_price <= Decimal::ZERO || position.unit_cost <= Decimal::ZERO {
            return None;
        }

        debug!(
            "Rescaling {} against reference price {} on {}",
            symbol, reference_price, reference_date
        );
        Some(position.unit_cost / reference_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn equity(id: &str, symbol: &str, purchase: Option<NaiveDate>) -> Position {
        Position {
            id: id.to_string(),
            instrument: Instrument::Equity {
                symbol: symbol.to_string(),
            },
            quantity: dec!(10),
            unit_cost: dec!(25),
            purchase_date: purchase,
            current_unit_price: dec!(30),
        }
    }

    fn calendar(dates: &[NaiveDate]) -> TradingCalendar {
        TradingCalendar::from_dates(dates.to_vec())
    }

    #[test]
    fn classifies_local_and_foreign_symbols() {
        let resolver = PositionResolver::new(".SA");
        assert_eq!(
            resolver.classify_currency(&Instrument::Equity {
                symbol: "PETR4.SA".to_string()
            }),
            CurrencyClass::Local
        );
        assert_eq!(
            resolver.classify_currency(&Instrument::Equity {
                symbol: "AAPL".to_string()
            }),
            CurrencyClass::Foreign
        );
        assert_eq!(
            resolver.classify_currency(&Instrument::FixedIncome {
                position_id: "fi-1".to_string()
            }),
            CurrencyClass::Local
        );
    }

    #[test]
    fn effective_start_snaps_to_next_calendar_date() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2), date(2024, 1, 5), date(2024, 1, 8)]);
        // Saturday purchase snaps to the following Monday entry.
        let positions = vec![equity("p1", "VALE3.SA", Some(date(2024, 1, 6)))];
        let resolved = resolver.resolve(&positions, &cal, &HashMap::new()).unwrap();
        assert_eq!(resolved[0].effective_start, date(2024, 1, 8));
    }

    #[test]
    fn effective_start_clamps_to_calendar_start() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2), date(2024, 1, 3)]);
        let positions = vec![equity("p1", "VALE3.SA", Some(date(2023, 6, 1)))];
        let resolved = resolver.resolve(&positions, &cal, &HashMap::new()).unwrap();
        assert_eq!(resolved[0].effective_start, date(2024, 1, 2));
    }

    #[test]
    fn missing_purchase_date_falls_back_to_earliest_known() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);
        let positions = vec![
            equity("p1", "VALE3.SA", Some(date(2024, 1, 3))),
            equity("p2", "ITUB4.SA", None),
        ];
        let resolved = resolver.resolve(&positions, &cal, &HashMap::new()).unwrap();
        assert_eq!(resolved[1].effective_start, date(2024, 1, 3));
    }

    #[test]
    fn price_scale_uses_next_available_reference() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);
        let mut series = PriceSeries::new();
        // No price on the start date; the reference is the next available.
        series.insert(date(2024, 1, 3), dec!(50));
        let mut prices = HashMap::new();
        prices.insert("VALE3.SA".to_string(), series);

        let positions = vec![equity("p1", "VALE3.SA", Some(date(2024, 1, 2)))];
        let resolved = resolver.resolve(&positions, &cal, &prices).unwrap();
        assert_eq!(resolved[0].price_scale, Some(dec!(0.5)));
    }

    #[test]
    fn empty_series_leaves_prices_unscaled() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2)]);
        let mut prices = HashMap::new();
        prices.insert("VALE3.SA".to_string(), PriceSeries::new());
        let positions = vec![equity("p1", "VALE3.SA", Some(date(2024, 1, 2)))];
        let resolved = resolver.resolve(&positions, &cal, &prices).unwrap();
        assert_eq!(resolved[0].price_scale, None);
    }

    #[test]
    fn zero_positions_is_insufficient_data() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2)]);
        let result = resolver.resolve(&[], &cal, &HashMap::new());
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InsufficientData(_)))
        ));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let resolver = PositionResolver::new(".SA");
        let cal = calendar(&[date(2024, 1, 2)]);
        let mut position = equity("p1", "VALE3.SA", None);
        position.quantity = dec!(-1);
        let result = resolver.resolve(&[position], &cal, &HashMap::new());
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));
    }
}
