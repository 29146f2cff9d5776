use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// What a position holds: an exchange-listed instrument identified by its
/// symbol, or a fixed-income instrument identified by the id the external
/// valuation service knows it under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Instrument {
    Equity { symbol: String },
    FixedIncome { position_id: String },
}

impl Instrument {
    /// The identifier used to reference this instrument in results.
    pub fn reference(&self) -> &str {
        match self {
            Instrument::Equity { symbol } => symbol,
            Instrument::FixedIncome { position_id } => position_id,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Instrument::Equity { symbol } => Some(symbol),
            Instrument::FixedIncome { .. } => None,
        }
    }
}

/// A holding as recorded by the CRUD layer. Immutable for the duration of
/// one analytics query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub instrument: Instrument,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub purchase_date: Option<NaiveDate>,
    pub current_unit_price: Decimal,
}

impl Position {
    pub fn validate(&self) -> Result<()> {
        if self.quantity.is_sign_negative() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Position {}: quantity must be non-negative",
                self.id
            ))));
        }
        if self.unit_cost.is_sign_negative() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Position {}: unit cost must be non-negative",
                self.id
            ))));
        }
        Ok(())
    }

    /// Recorded acquisition cost in the instrument's own currency.
    pub fn cost(&self) -> Decimal {
        self.quantity * self.unit_cost
    }

    /// Current market value in the instrument's own currency.
    pub fn current_value(&self) -> Decimal {
        self.quantity * self.current_unit_price
    }
}

/// Currency classification, resolved once per query and never re-derived
/// at computation sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyClass {
    Local,
    Foreign,
}

/// A position enriched with everything the valuation reconstructor needs:
/// its first contributing calendar date, currency class, and the factor
/// aligning the external adjusted-price series with the recorded purchase
/// price.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPosition {
    pub position: Position,
    pub effective_start: NaiveDate,
    pub currency_class: CurrencyClass,
    pub price_scale: Option<Decimal>,
}

impl ResolvedPosition {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_start
    }

    pub fn is_foreign(&self) -> bool {
        self.currency_class == CurrencyClass::Foreign
    }
}
