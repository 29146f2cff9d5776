use serde::{Deserialize, Serialize};

/// Scalar risk metrics derived once per query from a return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetricsSnapshot {
    pub sharpe: f64,
    pub sortino: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub var_95: f64,
    pub var_99: f64,
}
