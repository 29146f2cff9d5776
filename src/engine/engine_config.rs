use crate::constants::{DEFAULT_FETCH_CONCURRENCY, DEFAULT_SIMULATIONS, PRICE_LOOKBACK_ENTRIES};
use crate::performance::CalibrationParams;

/// Engine-wide configuration. Every heuristic threshold lives here rather
/// than being hard-coded at its use site.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Reporting currency of the portfolio.
    pub reporting_currency: String,
    /// Symbol under which the provider quotes the foreign/local rate.
    pub fx_symbol: String,
    /// Suffix marking symbols that trade on the local exchange.
    pub local_market_suffix: String,
    /// Bar interval requested from the provider.
    pub interval: String,
    /// Fixed worker-pool size for upstream fetches.
    pub fetch_concurrency: usize,
    /// Backward walk bound when a daily price is missing.
    pub price_lookback_entries: usize,
    /// Return-index reconciliation thresholds.
    pub calibration: CalibrationParams,
    /// Default Monte Carlo sample count.
    pub n_simulations: usize,
    /// Pin for reproducible stress runs; `None` draws entropy.
    pub simulation_seed: Option<u64>,
    /// Weight deltas at or below this fraction are treated as on-target.
    pub rebalance_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reporting_currency: "BRL".to_string(),
            fx_symbol: "USDBRL=X".to_string(),
            local_market_suffix: ".SA".to_string(),
            interval: "1d".to_string(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            price_lookback_entries: PRICE_LOOKBACK_ENTRIES,
            calibration: CalibrationParams::default(),
            n_simulations: DEFAULT_SIMULATIONS,
            simulation_seed: None,
            rebalance_epsilon: 0.005,
        }
    }
}
