use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calendar::TradingCalendar;
use super::valuation_reconstructor::{reconstruct, ReconstructionInputs};
use crate::market_data::{FiValuation, FiValuationSeries, FxSeries, PriceSeries};
use crate::positions::{CurrencyClass, Instrument, Position, ResolvedPosition};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn equity_position(
    id: &str,
    symbol: &str,
    quantity: Decimal,
    unit_cost: Decimal,
    start: NaiveDate,
    currency_class: CurrencyClass,
    price_scale: Option<Decimal>,
) -> ResolvedPosition {
    ResolvedPosition {
        position: Position {
            id: id.to_string(),
            instrument: Instrument::Equity {
                symbol: symbol.to_string(),
            },
            quantity,
            unit_cost,
            purchase_date: Some(start),
            current_unit_price: unit_cost,
        },
        effective_start: start,
        currency_class,
        price_scale,
    }
}

fn fi_position(
    id: &str,
    quantity: Decimal,
    unit_cost: Decimal,
    start: NaiveDate,
) -> ResolvedPosition {
    ResolvedPosition {
        position: Position {
            id: id.to_string(),
            instrument: Instrument::FixedIncome {
                position_id: id.to_string(),
            },
            quantity,
            unit_cost,
            purchase_date: Some(start),
            current_unit_price: unit_cost,
        },
        effective_start: start,
        currency_class: CurrencyClass::Local,
        price_scale: None,
    }
}

fn flat_fx(dates: &[NaiveDate], rate: Decimal) -> FxSeries {
    let mut fx = FxSeries::new();
    for d in dates {
        fx.insert(*d, rate);
    }
    fx
}

#[test]
fn purchase_day_market_value_equals_capital_deployed() {
    let dates = [date(2024, 2, 1), date(2024, 2, 2)];
    let calendar = TradingCalendar::from_dates(dates.to_vec());
    let fx = flat_fx(&dates, dec!(5));

    // Both positions purchased on day one at exactly the adjusted close.
    let mut series_a = PriceSeries::new();
    series_a.insert(dates[0], dec!(60));
    series_a.insert(dates[1], dec!(66));
    let mut series_b = PriceSeries::new();
    series_b.insert(dates[0], dec!(40));
    series_b.insert(dates[1], dec!(38));

    let mut prices = HashMap::new();
    prices.insert("AAAA3.SA".to_string(), series_a);
    prices.insert("BBBB4.SA".to_string(), series_b);

    let positions = vec![
        equity_position(
            "p1",
            "AAAA3.SA",
            dec!(10),
            dec!(60),
            dates[0],
            CurrencyClass::Local,
            Some(dec!(1)),
        ),
        equity_position(
            "p2",
            "BBBB4.SA",
            dec!(10),
            dec!(40),
            dates[0],
            CurrencyClass::Local,
            Some(dec!(1)),
        ),
    ];

    let valuations = reconstruct(&ReconstructionInputs {
        calendar: &calendar,
        positions: &positions,
        prices: &prices,
        fx: &fx,
        fi_series: &HashMap::new(),
        anchor_fx_rate: dec!(5),
        lookback_entries: 20,
    })
    .unwrap();

    assert_eq!(valuations[0].date, dates[0]);
    assert_eq!(valuations[0].market_value, valuations[0].capital_deployed);
    assert_eq!(valuations[0].capital_deployed, dec!(1000));
    // Day two reprices at the new closes.
    assert_eq!(valuations[1].market_value, dec!(1040));
}

#[test]
fn foreign_position_converts_at_daily_rate_and_anchors_capital() {
    let dates = [date(2024, 2, 1), date(2024, 2, 2)];
    let calendar = TradingCalendar::from_dates(dates.to_vec());
    let mut fx = FxSeries::new();
    fx.insert(dates[0], dec!(5.0));
    fx.insert(dates[1], dec!(5.2));

    let mut series = PriceSeries::new();
    series.insert(dates[0], dec!(100));
    series.insert(dates[1], dec!(100));
    let mut prices = HashMap::new();
    prices.insert("QQQQ".to_string(), series);

    let positions = vec![equity_position(
        "p1",
        "QQQQ",
        dec!(2),
        dec!(100),
        dates[0],
        CurrencyClass::Foreign,
        Some(dec!(1)),
    )];

    let valuations = reconstruct(&ReconstructionInputs {
        calendar: &calendar,
        positions: &positions,
        prices: &prices,
        fx: &fx,
        fi_series: &HashMap::new(),
        anchor_fx_rate: dec!(5.5),
        lookback_entries: 20,
    })
    .unwrap();

    // Market value follows the rate of each date.
    assert_eq!(valuations[0].market_value, dec!(1000.0));
    assert_eq!(valuations[1].market_value, dec!(1040.0));
    // Capital deployed is converted once, at the query-time anchor.
    assert_eq!(valuations[0].capital_deployed, dec!(1100.0));
    assert_eq!(valuations[1].capital_deployed, dec!(1100.0));
    // Net flow uses the rate of the entry date.
    assert_eq!(valuations[0].net_flow, dec!(1000.0));
}

#[test]
fn empty_price_history_falls_back_to_purchase_price_everywhere() {
    let dates = [date(2024, 2, 1), date(2024, 2, 2), date(2024, 2, 5)];
    let calendar = TradingCalendar::from_dates(dates.to_vec());
    let fx = flat_fx(&dates, dec!(5));

    let mut prices = HashMap::new();
    prices.insert("GONE3.SA".to_string(), PriceSeries::new());

    let positions = vec![equity_position(
        "p1",
        "GONE3.SA",
        dec!(4),
        dec!(25),
        dates[0],
        CurrencyClass::Local,
        None,
    )];

    let valuations = reconstruct(&ReconstructionInputs {
        calendar: &calendar,
        positions: &positions,
        prices: &prices,
        fx: &fx,
        fi_series: &HashMap::new(),
        anchor_fx_rate: dec!(5),
        lookback_entries: 20,
    })
    .unwrap();

    for valuation in &valuations {
        assert_eq!(valuation.market_value, dec!(100));
    }
}

#[test]
fn leading_dates_without_capital_are_dropped() {
    let dates = [
        date(2024, 2, 1),
        date(2024, 2, 2),
        date(2024, 2, 5),
        date(2024, 2, 6),
    ];
    let calendar = TradingCalendar::from_dates(dates.to_vec());
    let fx = flat_fx(&dates, dec!(5));

    let mut series = PriceSeries::new();
    for d in &dates {
        series.insert(*d, dec!(10));
    }
    let mut prices = HashMap::new();
    prices.insert("LATE3.SA".to_string(), series);

    let positions = vec![equity_position(
        "p1",
        "LATE3.SA",
        dec!(1),
        dec!(10),
        dates[2],
        CurrencyClass::Local,
        Some(dec!(1)),
    )];

    let valuations = reconstruct(&ReconstructionInputs {
        calendar: &calendar,
        positions: &positions,
        prices: &prices,
        fx: &fx,
        fi_series: &HashMap::new(),
        anchor_fx_rate: dec!(5),
        lookback_entries: 20,
    })
    .unwrap();

    assert_eq!(valuations.len(), 2);
    assert_eq!(valuations[0].date, dates[2]);
    assert!(!valuations[0].capital_deployed.is_zero());
}

#[test]
fn fixed_income_carries_dirty_price_forward() {
    let dates = [date(2024, 2, 1), date(2024, 2, 2), date(2024, 2, 5)];
    let calendar = TradingCalendar::from_dates(dates.to_vec());
    let fx = flat_fx(&dates, dec!(5));

    let mut fi = FiValuationSeries::new();
    fi.insert(
        dates[1],
        FiValuation {
            dirty_price: dec!(1050),
            clean_price: dec!(1040),
            accrued: dec!(10),
            ytm: dec!(0.11),
            duration: dec!(2.4),
            convexity: dec!(7.9),
        },
    );
    let mut fi_series = HashMap::new();
    fi_series.insert("fi-1".to_string(), fi);

    let positions = vec![fi_position("fi-1", dec!(2), dec!(1000), dates[0])];

    let valuations = reconstruct(&ReconstructionInputs {
        calendar: &calendar,
        positions: &positions,
        prices: &HashMap::new(),
        fx: &fx,
        fi_series: &fi_series,
        anchor_fx_rate: dec!(5),
        lookback_entries: 20,
    })
    .unwrap();

    // Purchase price anchors the first day, before any valuation exists.
    assert_eq!(valuations[0].market_value, dec!(2000));
    // The first dirty price applies from its date onward.
    assert_eq!(valuations[1].market_value, dec!(2100));
    assert_eq!(valuations[2].market_value, dec!(2100));
}
