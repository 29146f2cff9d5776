use chrono::{Datelike, NaiveDate, Weekday};

use crate::market_data::FxSeries;

/// The shared ordered sequence of valuation dates for one analytics query.
///
/// Invariant: strictly increasing and free of duplicates. Gaps in the
/// underlying series are carried forward by consumers, never silently
/// skipped here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Builds the calendar from the FX series' date keys. When `today` is a
    /// business day and absent from the series, it is appended and the last
    /// known FX value is carried forward onto it, so the series stays
    /// defined on every calendar date.
    pub fn from_fx_series(fx: &mut FxSeries, today: NaiveDate) -> Self {
        let mut dates: Vec<NaiveDate> = fx.dates().collect();

        if Self::is_business_day(today) && !dates.contains(&today) {
            if let Some((last_date, last_rate)) = fx.last_entry() {
                if today > last_date {
                    fx.insert(today, last_rate);
                    dates.push(today);
                }
            }
        }

        Self::from_dates(dates)
    }

    /// Builds a calendar from raw dates, sorting and de-duplicating.
    pub fn from_dates(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    pub fn is_business_day(date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The first calendar date on or after `date`.
    pub fn first_at_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.dates.partition_point(|d| *d < date);
        self.dates.get(idx).copied()
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Drops leading dates strictly before `date`. Never extends the
    /// calendar backward.
    pub fn trim_start_to(&mut self, date: NaiveDate) {
        let idx = self.dates.partition_point(|d| *d < date);
        self.dates.drain(..idx);
    }
}
