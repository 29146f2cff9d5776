use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Total portfolio state on one calendar date, in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPortfolioValuation {
    pub date: NaiveDate,
    /// Market value of all active positions.
    pub market_value: Decimal,
    /// Cumulative acquisition cost converted with the FX anchor fixed at
    /// query time, attributed at each position's effective start. A cost
    /// baseline comparable across the whole window.
    pub capital_deployed: Decimal,
    /// Cumulative acquisition cost converted with the FX rate of the date
    /// each position entered. Feeds the Modified Dietz flow terms.
    pub net_flow: Decimal,
}
