/// Decimal precision for valuation and return calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Maximum number of prior calendar entries scanned when a price is missing
pub const PRICE_LOOKBACK_ENTRIES: usize = 20;

/// Default number of concurrent upstream fetch requests
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Default Monte Carlo sample count for stress simulations
pub const DEFAULT_SIMULATIONS: usize = 2_000;

/// Minimum accepted Monte Carlo sample count
pub const MIN_SIMULATIONS: usize = 100;
