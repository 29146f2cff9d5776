use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::correlation::CorrelationMatrix;
use crate::constants::MIN_SIMULATIONS;
use crate::errors::{Error, Result, ValidationError};

/// Aggregate outcome of a Monte Carlo stress run, in the same periodicity
/// and units as the supplied expected returns and volatilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressTestSummary {
    pub expected_return: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub worst_case: f64,
    pub best_case: f64,
    pub n_simulations: usize,
}

/// A named market event applied as a fixed percentage impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressScenario {
    pub name: String,
    pub impact_pct: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressScenarioResult {
    pub scenario_name: String,
    pub impact_pct: f64,
    pub description: String,
    pub adjusted_value: f64,
}

pub struct StressTestInputs<'a> {
    pub weights: &'a [f64],
    pub volatilities: &'a [f64],
    pub expected_returns: &'a [f64],
    pub correlations: &'a CorrelationMatrix,
    pub n_simulations: usize,
    /// Pin for reproducible runs; `None` draws entropy.
    pub seed: Option<u64>,
}

/// The canonical historical scenarios, applied to current value rather
/// than simulated.
pub fn historical_scenarios() -> Vec<StressScenario> {
    vec![
        StressScenario {
            name: "2008 Financial Crisis".to_string(),
            impact_pct: -38.0,
            description: "Global equity collapse and credit freeze".to_string(),
        },
        StressScenario {
            name: "COVID-19 Crash 2020".to_string(),
            impact_pct: -34.0,
            description: "Pandemic shock, fastest bear market on record".to_string(),
        },
        StressScenario {
            name: "Rate Shock +200bps".to_string(),
            impact_pct: -12.0,
            description: "Abrupt monetary tightening hitting duration assets".to_string(),
        },
        StressScenario {
            name: "Tech Correction 2022".to_string(),
            impact_pct: -25.0,
            description: "Growth repricing under rising real yields".to_string(),
        },
    ]
}

/// Applies a fixed-impact scenario to the current portfolio value.
pub fn apply_scenario(scenario: &StressScenario, portfolio_value: f64) -> StressScenarioResult {
    StressScenarioResult {
        scenario_name: scenario.name.clone(),
        impact_pct: scenario.impact_pct,
        description: scenario.description.clone(),
        adjusted_value: portfolio_value * (1.0 + scenario.impact_pct / 100.0),
    }
}

/// Monte Carlo stress simulation: draws correlated normal returns from the
/// per-asset expectations, volatilities and correlation structure, and
/// summarizes the distribution of portfolio returns.
pub fn run_stress_test(inputs: &StressTestInputs) -> Result<StressTestSummary> {
    let n = inputs.weights.len();
    if n == 0 {
        return Err(Error::Validation(ValidationError::InsufficientData(
            "stress test requires at least one asset".to_string(),
        )));
    }
    if inputs.volatilities.len() != n
        || inputs.expected_returns.len() != n
        || inputs.correlations.len() != n
    {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "weights, volatilities, expected returns and correlation matrix must agree in size"
                .to_string(),
        )));
    }
    if inputs
        .weights
        .iter()
        .chain(inputs.volatilities)
        .chain(inputs.expected_returns)
        .any(|v| !v.is_finite())
    {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "non-finite value in stress test inputs".to_string(),
        )));
    }

    let n_simulations = inputs.n_simulations.max(MIN_SIMULATIONS);
    let cholesky = cholesky_decomposition(inputs.correlations);

    let mut rng = match inputs.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut portfolio_returns = Vec::with_capacity(n_simulations);
    for _ in 0..n_simulations {
        let z: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let correlated = apply_cholesky(&cholesky, &z, n);

        let mut sample_return = 0.0;
        for i in 0..n {
            sample_return +=
                inputs.weights[i] * (inputs.expected_returns[i] + inputs.volatilities[i] * correlated[i]);
        }
        portfolio_returns.push(sample_return);
    }

    portfolio_returns.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let expected_return =
        portfolio_returns.iter().sum::<f64>() / portfolio_returns.len() as f64;
    let var_95 = -percentile(&portfolio_returns, 0.05);
    let var_99 = -percentile(&portfolio_returns, 0.01);
    let tail_len = ((0.05 * portfolio_returns.len() as f64).floor() as usize).max(1);
    let cvar_95 =
        -(portfolio_returns[..tail_len].iter().sum::<f64>() / tail_len as f64);

    debug!(
        "Stress run over {} samples: E[r]={:.6}, VaR95={:.6}",
        n_simulations, expected_return, var_95
    );

    Ok(StressTestSummary {
        expected_return,
        var_95,
        var_99,
        cvar_95,
        worst_case: portfolio_returns[0],
        best_case: portfolio_returns[portfolio_returns.len() - 1],
        n_simulations,
    })
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// In-place Cholesky factor of the correlation matrix, row-major. Non
/// positive-definite inputs degrade to a zero pivot instead of failing.
fn cholesky_decomposition(correlations: &CorrelationMatrix) -> Vec<f64> {
    let n = correlations.len();
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[i * n + k] * l[j * n + k];
            }

            if i == j {
                let diag = correlations.get(i, i) - sum;
                l[i * n + j] = if diag > 0.0 { diag.sqrt() } else { 0.0 };
            } else {
                let l_jj = l[j * n + j];
                l[i * n + j] = if l_jj.abs() > 1e-10 {
                    (correlations.get(i, j) - sum) / l_jj
                } else {
                    0.0
                };
            }
        }
    }

    l
}

/// Applies the Cholesky factor to independent standard normals.
fn apply_cholesky(l: &[f64], z: &[f64], n: usize) -> Vec<f64> {
    let mut result = vec![0.0; n];
    for i in 0..n {
        for j in 0..=i {
            result[i] += l[i * n + j] * z[j];
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_asset_inputs<'a>(
        correlations: &'a CorrelationMatrix,
        weights: &'a [f64],
        volatilities: &'a [f64],
        expected_returns: &'a [f64],
    ) -> StressTestInputs<'a> {
        StressTestInputs {
            weights,
            volatilities,
            expected_returns,
            correlations,
            n_simulations: 5_000,
            seed: Some(42),
        }
    }

    #[test]
    fn fixed_impact_scenario_adjusts_value() {
        let scenario = StressScenario {
            name: "Test".to_string(),
            impact_pct: -20.0,
            description: "".to_string(),
        };
        let result = apply_scenario(&scenario, 100_000.0);
        assert!((result.adjusted_value - 80_000.0).abs() < 1e-9);
    }

    #[test]
    fn historical_catalogue_is_all_losses() {
        let scenarios = historical_scenarios();
        assert!(!scenarios.is_empty());
        for scenario in scenarios {
            assert!(scenario.impact_pct < 0.0);
        }
    }

    #[test]
    fn simulation_summary_is_internally_consistent() {
        let corr = CorrelationMatrix::from_parts(
            vec!["a".to_string(), "b".to_string()],
            vec![1.0, 0.5, 0.5, 1.0],
        );
        let summary = run_stress_test(&two_asset_inputs(
            &corr,
            &[0.6, 0.4],
            &[0.15, 0.20],
            &[0.08, 0.10],
        ))
        .unwrap();

        assert!(summary.worst_case <= summary.best_case);
        assert!(summary.var_99 >= summary.var_95);
        assert!(summary.cvar_95 >= summary.var_95);
        assert!(summary.expected_return > summary.worst_case);
        assert!(summary.expected_return < summary.best_case);
        // Mean of samples should land near the weighted expectation.
        let expectation = 0.6 * 0.08 + 0.4 * 0.10;
        assert!((summary.expected_return - expectation).abs() < 0.02);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let corr = CorrelationMatrix::from_parts(
            vec!["a".to_string(), "b".to_string()],
            vec![1.0, 0.2, 0.2, 1.0],
        );
        let weights = [0.5, 0.5];
        let volatilities = [0.10, 0.12];
        let expected_returns = [0.05, 0.07];
        let inputs = two_asset_inputs(&corr, &weights, &volatilities, &expected_returns);
        let first = run_stress_test(&inputs).unwrap();
        let second = run_stress_test(&inputs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let corr = CorrelationMatrix::identity(vec![]);
        let result = run_stress_test(&StressTestInputs {
            weights: &[],
            volatilities: &[],
            expected_returns: &[],
            correlations: &corr,
            n_simulations: 1_000,
            seed: Some(1),
        });
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InsufficientData(_)))
        ));
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let corr = CorrelationMatrix::identity(vec!["a".to_string()]);
        let result = run_stress_test(&StressTestInputs {
            weights: &[f64::NAN],
            volatilities: &[0.1],
            expected_returns: &[0.05],
            correlations: &corr,
            n_simulations: 1_000,
            seed: Some(1),
        });
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));
    }
}
