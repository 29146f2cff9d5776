use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest quote for a symbol, as returned by the market data collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub current_price: Decimal,
}

/// One point of an adjusted price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuote {
    pub date: NaiveDate,
    pub close: Decimal,
    pub adjusted_close: Decimal,
}

/// Ordered adjusted-price history for a single symbol.
///
/// Append-only within a query; missing dates are handled by the
/// consumer's fallback rules, never filled in here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    prices: BTreeMap<NaiveDate, Decimal>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_history(history: &[HistoricalQuote]) -> Self {
        let prices = history
            .iter()
            .map(|q| (q.date, q.adjusted_close))
            .collect();
        Self { prices }
    }

    pub fn insert(&mut self, date: NaiveDate, price: Decimal) {
        self.prices.insert(date, price);
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.prices.get(&date).copied()
    }

    /// First known price on or after `date`, used as the rescale reference.
    pub fn at_or_after(&self, date: NaiveDate) -> Option<(NaiveDate, Decimal)> {
        self.prices.range(date..).next().map(|(d, p)| (*d, *p))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.prices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Ordered foreign/local exchange rate history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxSeries {
    rates: BTreeMap<NaiveDate, Decimal>,
}

impl FxSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_history(history: &[HistoricalQuote]) -> Self {
        let rates = history.iter().map(|q| (q.date, q.close)).collect();
        Self { rates }
    }

    pub fn insert(&mut self, date: NaiveDate, rate: Decimal) {
        self.rates.insert(date, rate);
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates.get(&date).copied()
    }

    /// Carry-forward lookup: the last known rate on or before `date`.
    pub fn rate_at_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates.range(..=date).next_back().map(|(_, r)| *r)
    }

    pub fn last_entry(&self) -> Option<(NaiveDate, Decimal)> {
        self.rates.iter().next_back().map(|(d, r)| (*d, *r))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// One day of fixed-income analytics from the external valuation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiValuation {
    pub dirty_price: Decimal,
    pub clean_price: Decimal,
    pub accrued: Decimal,
    pub ytm: Decimal,
    pub duration: Decimal,
    pub convexity: Decimal,
}

/// Ordered valuation history for one fixed-income position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiValuationSeries {
    points: BTreeMap<NaiveDate, FiValuation>,
}

impl FiValuationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<(NaiveDate, FiValuation)>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, date: NaiveDate, valuation: FiValuation) {
        self.points.insert(date, valuation);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&FiValuation> {
        self.points.get(&date)
    }

    /// Carry-forward lookup on the dirty price.
    pub fn dirty_price_at_or_before(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .range(..=date)
            .next_back()
            .map(|(_, v)| v.dirty_price)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
