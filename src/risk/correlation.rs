use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Square, symmetric Pearson correlation matrix across assets.
///
/// Stored row-major; the diagonal is exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    assets: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub(crate) fn from_parts(assets: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), assets.len() * assets.len());
        Self { assets, values }
    }

    /// Identity matrix, the degenerate correlation structure.
    pub fn identity(assets: Vec<String>) -> Self {
        let n = assets.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self { assets, values }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.assets.len() + j]
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Pairwise Pearson correlation between asset return series, aligned on
/// the most recent overlapping window of each pair. Requires at least two
/// assets; zero-variance pairs correlate as 0.
pub fn correlation_matrix(returns_by_asset: &BTreeMap<String, Vec<f64>>) -> Result<CorrelationMatrix> {
    if returns_by_asset.len() < 2 {
        return Err(Error::Validation(ValidationError::InsufficientData(
            "correlation requires at least 2 assets".to_string(),
        )));
    }

    let assets: Vec<String> = returns_by_asset.keys().cloned().collect();
    let series: Vec<&Vec<f64>> = returns_by_asset.values().collect();
    let n = assets.len();

    let mut values = vec![0.0; n * n];
    for i in 0..n {
        values[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let rho = pearson(series[i], series[j]);
            values[i * n + j] = rho;
            values[j * n + i] = rho;
        }
    }

    Ok(CorrelationMatrix::from_parts(assets, values))
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    if len < 2 {
        return 0.0;
    }
    // Align on the most recent overlapping window.
    let a = &a[a.len() - len..];
    let b = &b[b.len() - len..];

    let mean_a = a.iter().sum::<f64>() / len as f64;
    let mean_b = b.iter().sum::<f64>() / len as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = var_a.sqrt() * var_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}
