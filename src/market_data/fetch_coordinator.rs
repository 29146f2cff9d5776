use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use super::market_data_model::{FiValuationSeries, FxSeries, PriceSeries};
use super::market_data_traits::{FixedIncomeValuerTrait, MarketDataProviderTrait};
use crate::errors::{Error, Result};

/// Everything one analytics query needs from the upstream collaborators.
///
/// Owned by the query; there is no cross-query shared state.
#[derive(Debug, Clone)]
pub struct MarketDataBundle {
    pub prices: HashMap<String, PriceSeries>,
    pub fx: FxSeries,
    pub fi_series: HashMap<String, FiValuationSeries>,
    /// FX rate fixed at query time, used as the conversion anchor.
    pub live_fx_rate: Decimal,
    /// Symbols whose history fetch failed and degraded to an empty series.
    pub failed_symbols: Vec<String>,
}

/// Retrieves price, FX and fixed-income valuation histories with bounded
/// concurrency. Failure of one symbol never aborts the batch; the symbol
/// degrades to an empty series and downstream fallback pricing takes over.
pub struct SeriesFetchCoordinator {
    market_data: Arc<dyn MarketDataProviderTrait>,
    fi_valuer: Arc<dyn FixedIncomeValuerTrait>,
    fx_symbol: String,
    concurrency: usize,
    generation: AtomicU64,
}

impl SeriesFetchCoordinator {
    pub fn new(
        market_data: Arc<dyn MarketDataProviderTrait>,
        fi_valuer: Arc<dyn FixedIncomeValuerTrait>,
        fx_symbol: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            market_data,
            fi_valuer,
            fx_symbol: fx_symbol.into(),
            concurrency: concurrency.max(1),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a new query context, invalidating all in-flight fetches of
    /// earlier contexts. Results tagged with an older generation are
    /// discarded at merge time.
    pub fn begin_query(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Fetches adjusted price histories for all symbols, batched to the
    /// configured concurrency. A failed symbol yields an empty series.
    pub async fn fetch_histories(
        &self,
        symbols: &[String],
        period: &str,
        interval: &str,
    ) -> (HashMap<String, PriceSeries>, Vec<String>) {
        let mut all_series = HashMap::with_capacity(symbols.len());
        let mut failed: Vec<String> = Vec::new();

        for chunk in symbols.chunks(self.concurrency) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|symbol| {
                    let symbol = symbol.clone();
                    async move {
                        match self
                            .market_data
                            .get_price_history(&symbol, period, interval)
                            .await
                        {
                            Ok(history) => (symbol, PriceSeries::from_history(&history)),
                            Err(e) => {
                                warn!(
                                    "History fetch failed for {}: {}. Degrading to empty series.",
                                    symbol, e
                                );
                                (symbol, PriceSeries::new())
                            }
                        }
                    }
                })
                .collect();

            for (symbol, series) in futures::future::join_all(futures).await {
                if series.is_empty() {
                    failed.push(symbol.clone());
                }
                all_series.insert(symbol, series);
            }
        }

        (all_series, failed)
    }

    /// Fetches the foreign/local exchange rate history. An empty series is
    /// returned on failure and surfaces later as insufficient data.
    pub async fn fetch_fx(&self, period: &str, interval: &str) -> FxSeries {
        match self
            .market_data
            .get_price_history(&self.fx_symbol, period, interval)
            .await
        {
            Ok(history) => FxSeries::from_history(&history),
            Err(e) => {
                warn!("FX history fetch failed for {}: {}", self.fx_symbol, e);
                FxSeries::new()
            }
        }
    }

    /// Fetches the valuation series for one fixed-income position.
    pub async fn fetch_fi_series(
        &self,
        position_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> FiValuationSeries {
        match self
            .fi_valuer
            .get_valuation_series(position_id, start_date, end_date)
            .await
        {
            Ok(points) => FiValuationSeries::from_points(points),
            Err(e) => {
                warn!(
                    "Fixed-income valuation fetch failed for {}: {}. Degrading to empty series.",
                    position_id, e
                );
                FiValuationSeries::new()
            }
        }
    }

    /// Retrieves everything a query needs. Returns `Error::StaleQuery` when
    /// a newer query context was started while fetches were in flight, so
    /// stale results are never merged into a newer computation.
    pub async fn fetch_bundle(
        &self,
        generation: u64,
        symbols: &[String],
        fi_positions: &[(String, NaiveDate, NaiveDate)],
        period: &str,
        interval: &str,
    ) -> Result<MarketDataBundle> {
        let fx = self.fetch_fx(period, interval).await;
        let (prices, failed_symbols) = self.fetch_histories(symbols, period, interval).await;

        let mut fi_series = HashMap::with_capacity(fi_positions.len());
        for chunk in fi_positions.chunks(self.concurrency) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|(position_id, start, end)| {
                    let position_id = position_id.clone();
                    let (start, end) = (*start, *end);
                    async move {
                        let series = self.fetch_fi_series(&position_id, start, end).await;
                        (position_id, series)
                    }
                })
                .collect();

            for (position_id, series) in futures::future::join_all(futures).await {
                fi_series.insert(position_id, series);
            }
        }

        let live_fx_rate = match self.market_data.get_quote(&self.fx_symbol).await {
            Ok(quote) => quote.current_price,
            Err(e) => {
                let fallback = fx.last_entry().map(|(_, r)| r).unwrap_or(Decimal::ONE);
                warn!(
                    "Live FX quote failed for {}: {}. Falling back to last historical rate {}.",
                    self.fx_symbol, e, fallback
                );
                fallback
            }
        };

        if !self.is_current(generation) {
            return Err(Error::StaleQuery);
        }

        Ok(MarketDataBundle {
            prices,
            fx,
            fi_series,
            live_fx_rate,
            failed_symbols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::market_data_model::{FiValuation, HistoricalQuote, Quote};
    use crate::market_data::MarketDataError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct MockProvider {
        failing: HashSet<String>,
    }

    #[async_trait]
    impl MarketDataProviderTrait for MockProvider {
        async fn get_quote(&self, symbol: &str) -> crate::errors::Result<Quote> {
            Ok(Quote {
                symbol: symbol.to_string(),
                current_price: dec!(5.1),
            })
        }

        async fn get_price_history(
            &self,
            symbol: &str,
            _period: &str,
            _interval: &str,
        ) -> crate::errors::Result<Vec<HistoricalQuote>> {
            if self.failing.contains(symbol) {
                return Err(MarketDataError::ProviderError(format!(
                    "upstream down for {}",
                    symbol
                ))
                .into());
            }
            Ok(vec![HistoricalQuote {
                date: date(2024, 3, 4),
                close: dec!(10),
                adjusted_close: dec!(10),
            }])
        }
    }

    struct MockValuer;

    #[async_trait]
    impl FixedIncomeValuerTrait for MockValuer {
        async fn get_valuation(
            &self,
            position_id: &str,
            _asof_date: NaiveDate,
        ) -> crate::errors::Result<FiValuation> {
            Err(MarketDataError::NotFound(position_id.to_string()).into())
        }

        async fn get_valuation_series(
            &self,
            _position_id: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> crate::errors::Result<Vec<(NaiveDate, FiValuation)>> {
            Ok(Vec::new())
        }
    }

    fn coordinator(failing: &[&str]) -> SeriesFetchCoordinator {
        SeriesFetchCoordinator::new(
            Arc::new(MockProvider {
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }),
            Arc::new(MockValuer),
            "USDBRL=X",
            3,
        )
    }

    #[tokio::test]
    async fn failed_symbol_degrades_to_empty_series_without_aborting() {
        let coordinator = coordinator(&["BAD"]);
        let symbols = vec!["GOOD".to_string(), "BAD".to_string()];
        let (series, failed) = coordinator.fetch_histories(&symbols, "1y", "1d").await;

        assert_eq!(series.len(), 2);
        assert!(!series["GOOD"].is_empty());
        assert!(series["BAD"].is_empty());
        assert_eq!(failed, vec!["BAD".to_string()]);
    }

    #[tokio::test]
    async fn stale_generation_is_discarded_at_merge() {
        let coordinator = coordinator(&[]);
        let stale = coordinator.begin_query();
        // A newer query supersedes the first before its merge.
        let _current = coordinator.begin_query();

        let result = coordinator
            .fetch_bundle(stale, &["GOOD".to_string()], &[], "1y", "1d")
            .await;
        assert!(matches!(result, Err(Error::StaleQuery)));
    }

    #[tokio::test]
    async fn current_generation_merges_and_carries_live_rate() {
        let coordinator = coordinator(&[]);
        let generation = coordinator.begin_query();
        let bundle = coordinator
            .fetch_bundle(generation, &["GOOD".to_string()], &[], "1y", "1d")
            .await
            .unwrap();

        assert_eq!(bundle.live_fx_rate, dec!(5.1));
        assert!(bundle.failed_symbols.is_empty());
        assert!(!bundle.fx.is_empty());
    }
}
