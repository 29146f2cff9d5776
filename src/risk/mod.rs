pub(crate) mod correlation;
pub(crate) mod risk_metrics;
pub(crate) mod risk_model;
pub(crate) mod stress;

pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use risk_metrics::{
    compute_risk_metrics, cvar_historical, max_drawdown, sharpe_ratio, sortino_ratio,
    var_historical, var_parametric, volatility,
};
pub use risk_model::RiskMetricsSnapshot;
pub use stress::{
    apply_scenario, historical_scenarios, run_stress_test, StressScenario, StressScenarioResult,
    StressTestInputs, StressTestSummary,
};
