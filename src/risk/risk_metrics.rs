//! Pure statistical functions over periodic returns.
//!
//! Stateless, no async, no external collaborators. Every function tolerates
//! series of length 0 or 1 by returning a neutral value instead of raising.

use super::risk_model::RiskMetricsSnapshot;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1) of periodic returns.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns);
    let variance =
        returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (returns.len() as f64 - 1.0);
    variance.sqrt()
}

/// Sharpe ratio over periodic returns and a per-period risk-free rate.
/// Guarded to 0 when the volatility is 0 or the series is too short.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() <= 1 {
        return 0.0;
    }
    let vol = volatility(returns);
    if vol < f64::EPSILON {
        return 0.0;
    }
    (mean(returns) - risk_free_rate) / vol
}

/// Sortino ratio: only the downside deviation below the risk-free target
/// enters the denominator.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() <= 1 {
        return 0.0;
    }
    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < risk_free_rate)
        .map(|r| (r - risk_free_rate).powi(2))
        .sum();
    let downside_dev = (downside_sq / (returns.len() as f64 - 1.0)).sqrt();
    if downside_dev < f64::EPSILON {
        return 0.0;
    }
    (mean(returns) - risk_free_rate) / downside_dev
}

/// Maximum peak-to-trough drawdown of the compounded return path,
/// reconstructed from an index starting at 100. Always >= 0.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mut value = 100.0;
    let mut peak = 100.0;
    let mut max_dd = 0.0_f64;
    for r in returns {
        value *= 1.0 + r;
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.max(0.0)
}

/// Empirical Value-at-Risk at the given confidence (0.95, 0.99), expressed
/// as a positive loss.
pub fn var_historical(returns: &[f64], confidence: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    -sorted[idx.min(sorted.len() - 1)]
}

/// Parametric (normal) Value-at-Risk at the given confidence, expressed as
/// a positive loss.
pub fn var_parametric(returns: &[f64], confidence: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let z = norm_inv(1.0 - confidence);
    -(mean(returns) + z * volatility(returns))
}

/// Conditional VaR (expected shortfall): the mean loss beyond the
/// historical percentile.
pub fn cvar_historical(returns: &[f64], confidence: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let cutoff = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    let cutoff = cutoff.clamp(1, sorted.len());
    let tail = &sorted[..cutoff];
    -(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Assembles the per-query risk snapshot from a return series and a
/// per-period risk-free rate.
pub fn compute_risk_metrics(returns: &[f64], risk_free_rate: f64) -> RiskMetricsSnapshot {
    RiskMetricsSnapshot {
        sharpe: sharpe_ratio(returns, risk_free_rate),
        sortino: sortino_ratio(returns, risk_free_rate),
        volatility: volatility(returns),
        max_drawdown: max_drawdown(returns),
        var_95: var_historical(returns, 0.95),
        var_99: var_historical(returns, 0.99),
    }
}

/// Standard normal inverse CDF (rational approximation).
pub(crate) fn norm_inv(p: f64) -> f64 {
    let p_clamped = p.clamp(1e-10, 1.0 - 1e-10);
    let t = if p_clamped < 0.5 {
        (-2.0 * p_clamped.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p_clamped).ln()).sqrt()
    };

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let result = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p_clamped < 0.5 {
        -result
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_returns_have_zero_volatility_and_guarded_sharpe() {
        let returns = vec![0.01, 0.01, 0.01];
        assert_eq!(volatility(&returns), 0.0);
        assert_eq!(sharpe_ratio(&returns, 0.0), 0.0);
    }

    #[test]
    fn empty_and_single_series_are_neutral() {
        assert_eq!(volatility(&[]), 0.0);
        assert_eq!(sharpe_ratio(&[0.02], 0.0), 0.0);
        assert_eq!(sortino_ratio(&[], 0.0), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(var_historical(&[0.01], 0.95), 0.0);
        assert_eq!(cvar_historical(&[], 0.95), 0.0);
    }

    #[test]
    fn volatility_matches_sample_stdev() {
        let returns = vec![0.01, -0.01, 0.02, -0.02];
        // mean = 0, variance = (1 + 1 + 4 + 4) * 1e-4 / 3
        let expected = (0.001 / 3.0_f64).sqrt();
        assert!((volatility(&returns) - expected).abs() < 1e-12);
    }

    #[test]
    fn sortino_ignores_upside_deviation() {
        let returns = vec![0.05, 0.04, -0.02, 0.03, -0.01];
        let sortino = sortino_ratio(&returns, 0.0);
        let sharpe = sharpe_ratio(&returns, 0.0);
        assert!(sortino > sharpe);
    }

    #[test]
    fn all_positive_returns_give_zero_sortino_denominator_guard() {
        let returns = vec![0.01, 0.02, 0.03];
        assert_eq!(sortino_ratio(&returns, 0.0), 0.0);
    }

    #[test]
    fn max_drawdown_on_a_known_path() {
        // 100 -> 110 -> 99 -> 103.95
        let returns = vec![0.10, -0.10, 0.05];
        let dd = max_drawdown(&returns);
        assert!((dd - 0.10).abs() < 1e-12);
    }

    #[test]
    fn historical_var_picks_the_tail_percentile() {
        let returns = vec![
            -0.05, -0.03, -0.01, 0.0, 0.01, 0.02, 0.03, 0.04, 0.05, 0.06,
        ];
        let var95 = var_historical(&returns, 0.95);
        assert!((var95 - 0.05).abs() < 1e-12);

        let cvar95 = cvar_historical(&returns, 0.95);
        assert!(cvar95 >= var95);
    }

    #[test]
    fn parametric_var_grows_with_confidence() {
        let returns = vec![0.01, -0.02, 0.015, -0.005, 0.02, -0.01, 0.0, 0.005];
        assert!(var_parametric(&returns, 0.99) > var_parametric(&returns, 0.95));
    }

    #[test]
    fn norm_inv_brackets_standard_quantiles() {
        assert!((norm_inv(0.975) - 1.96).abs() < 0.01);
        assert!((norm_inv(0.5)).abs() < 0.01);
        assert!((norm_inv(0.025) + 1.96).abs() < 0.01);
    }

    #[test]
    fn snapshot_is_nonnegative_where_required() {
        let returns = vec![0.01, -0.03, 0.02, -0.015, 0.005];
        let snapshot = compute_risk_metrics(&returns, 0.0);
        assert!(snapshot.volatility >= 0.0);
        assert!(snapshot.max_drawdown >= 0.0);
        assert!(snapshot.var_99 >= snapshot.var_95);
    }
}
