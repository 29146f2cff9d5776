pub(crate) mod fetch_coordinator;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_traits;

// Re-export the public interface
pub use fetch_coordinator::{MarketDataBundle, SeriesFetchCoordinator};
pub use market_data_model::{
    FiValuation, FiValuationSeries, FxSeries, HistoricalQuote, PriceSeries, Quote,
};
pub use market_data_traits::{FixedIncomeValuerTrait, MarketDataProviderTrait};

// Re-export error types for convenience
pub use market_data_errors::MarketDataError;
