use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_model::{FiValuation, HistoricalQuote, Quote};
use crate::errors::Result;

/// Market data collaborator owned by the transport layer.
///
/// The engine only consumes this interface; it never performs network
/// retrieval itself.
#[async_trait]
pub trait MarketDataProviderTrait: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    async fn get_price_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<HistoricalQuote>>;
}

/// External bond-math valuation collaborator (clean/dirty price, accrued,
/// YTM, duration, convexity). The engine consumes its output as-is.
#[async_trait]
pub trait FixedIncomeValuerTrait: Send + Sync {
    async fn get_valuation(&self, position_id: &str, asof_date: NaiveDate) -> Result<FiValuation>;

    async fn get_valuation_series(
        &self,
        position_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, FiValuation)>>;
}
