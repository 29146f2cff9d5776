pub(crate) mod rebalancing_model;
pub(crate) mod rebalancing_service;

pub use rebalancing_model::{
    RebalanceAction, RebalanceConstraints, RebalancingRecommendation,
};
pub use rebalancing_service::generate_recommendations;
