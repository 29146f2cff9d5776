use std::num::ParseFloatError;
use thiserror::Error;

use crate::market_data::MarketDataError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the analytics engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Currency operation failed: {0}")]
    Currency(#[from] CurrencyError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Query was superseded by a newer request")]
    StaleQuery,
}

#[derive(Error, Debug)]
pub enum CurrencyError {
    #[error("No exchange rate available for {0}")]
    MissingRate(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to parse number: {0}")]
    NumberParse(#[from] ParseFloatError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Return index diverged from the live return: {0}")]
    CalibrationDivergence(String),
}

// Add From implementation for rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
