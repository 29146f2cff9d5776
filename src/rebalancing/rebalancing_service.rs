use std::collections::BTreeMap;

use crate::errors::{Error, Result, ValidationError};

use super::rebalancing_model::{
    RebalanceAction, RebalanceConstraints, RebalancingRecommendation,
};

/// Pure mapping from current/target weights and a constraint set to
/// buy/sell/hold recommendations. Weights are fractions of the portfolio;
/// assets present on only one side are treated as weight 0 on the other.
pub fn generate_recommendations(
    current_weights: &BTreeMap<String, f64>,
    target_weights: &BTreeMap<String, f64>,
    constraints: &RebalanceConstraints,
    epsilon: f64,
) -> Result<Vec<RebalancingRecommendation>> {
    constraints.validate()?;
    if current_weights.is_empty() && target_weights.is_empty() {
        return Err(Error::Validation(ValidationError::InsufficientData(
            "no weights to rebalance".to_string(),
        )));
    }
    for (asset, weight) in current_weights.iter().chain(target_weights) {
        if !weight.is_finite() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Non-finite weight for {}",
                asset
            ))));
        }
    }

    let mut assets: Vec<&String> = current_weights.keys().chain(target_weights.keys()).collect();
    assets.sort();
    assets.dedup();

    let recommendations = assets
        .into_iter()
        .map(|asset| {
            let current = current_weights.get(asset).copied().unwrap_or(0.0);
            let target = target_weights.get(asset).copied().unwrap_or(0.0);
            let delta = target - current;

            let action = if delta > epsilon {
                RebalanceAction::Buy
            } else if delta < -epsilon {
                RebalanceAction::Sell
            } else {
                RebalanceAction::Hold
            };

            RebalancingRecommendation {
                instrument_ref: asset.clone(),
                current_weight: current,
                target_weight: target,
                action,
                amount_pct: delta.abs() * 100.0,
                rationale: rationale_for(action, delta, constraints),
            }
        })
        .collect();

    Ok(recommendations)
}

fn rationale_for(
    action: RebalanceAction,
    delta: f64,
    constraints: &RebalanceConstraints,
) -> String {
    let gap_pct = delta.abs() * 100.0;
    match action {
        RebalanceAction::Buy => {
            let mut text = format!(
                "Underweight by {:.2} pp against the {} profile target; buy to close the gap",
                gap_pct, constraints.risk_profile
            );
            if let Some(target_return) = constraints.target_return {
                text.push_str(&format!(
                    " and support the {:.1}% return target",
                    target_return * 100.0
                ));
            }
            text
        }
        RebalanceAction::Sell => {
            let mut text = format!(
                "Overweight by {:.2} pp against the {} profile target; sell to close the gap",
                gap_pct, constraints.risk_profile
            );
            if let Some(max_volatility) = constraints.max_volatility {
                text.push_str(&format!(
                    " and keep volatility within {:.1}%",
                    max_volatility * 100.0
                ));
            }
            text
        }
        RebalanceAction::Hold => format!(
            "Within {:.2} pp of the {} profile target; no action needed",
            gap_pct, constraints.risk_profile
        ),
    }
}
