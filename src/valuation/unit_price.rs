use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::calendar::TradingCalendar;
use crate::market_data::PriceSeries;

/// Everything needed to price one equity position on one date.
pub(crate) struct PriceContext<'a> {
    pub series: Option<&'a PriceSeries>,
    pub scale: Option<Decimal>,
    pub purchase_price: Decimal,
    pub effective_start: NaiveDate,
    pub calendar: &'a TradingCalendar,
    pub lookback_entries: usize,
}

/// Ordered unit-price fallback strategies, applied until one resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PriceFallback {
    /// The scale-adjusted quote on the date itself.
    ScaledQuote,
    /// The last known price within a bounded backward walk over prior
    /// calendar entries.
    LookbackWindow,
    /// The recorded purchase price, permitted only on the effective start
    /// date itself.
    PurchaseAnchor,
}

pub(crate) const EQUITY_FALLBACKS: &[PriceFallback] = &[
    PriceFallback::ScaledQuote,
    PriceFallback::LookbackWindow,
    PriceFallback::PurchaseAnchor,
];

/// Resolves the unit price for `date`, trying each fallback in order.
/// `None` means no strategy applied; the reconstructor then carries the
/// last resolved value forward.
pub(crate) fn resolve_unit_price(ctx: &PriceContext, date: NaiveDate) -> Option<Decimal> {
    EQUITY_FALLBACKS
        .iter()
        .find_map(|strategy| apply_strategy(*strategy, ctx, date))
}

fn apply_strategy(
    strategy: PriceFallback,
    ctx: &PriceContext,
    date: NaiveDate,
) -> Option<Decimal> {
    match strategy {
        PriceFallback::ScaledQuote => ctx.series?.get(date).map(|price| scaled(ctx, price)),
        PriceFallback::LookbackWindow => {
            let series = ctx.series?;
            let idx = ctx.calendar.position_of(date)?;
            let floor = idx.saturating_sub(ctx.lookback_entries);
            ctx.calendar.dates()[floor..idx]
                .iter()
                .rev()
                .find_map(|prior| series.get(*prior))
                .map(|price| scaled(ctx, price))
        }
        PriceFallback::PurchaseAnchor => {
            (date == ctx.effective_start).then_some(ctx.purchase_price)
        }
    }
}

fn scaled(ctx: &PriceContext, price: Decimal) -> Decimal {
    match ctx.scale {
        Some(scale) => price * scale,
        None => price,
    }
}
