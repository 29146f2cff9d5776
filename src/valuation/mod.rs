pub(crate) mod calendar;
pub(crate) mod unit_price;
pub(crate) mod valuation_model;
pub(crate) mod valuation_reconstructor;

#[cfg(test)]
mod valuation_reconstructor_tests;

pub use calendar::TradingCalendar;
pub use valuation_model::DailyPortfolioValuation;
pub use valuation_reconstructor::{reconstruct, ReconstructionInputs};
