pub(crate) mod engine_config;
pub(crate) mod engine_service;

pub use engine_config::EngineConfig;
pub use engine_service::AnalyticsEngine;
