//! Date range resolution for cost queries
//!
//! Turns the CLI-level time selectors (an explicit day count, or a number
//! of trailing calendar months) into a concrete `[start, end)` range. The
//! end of the range is always "now" at resolution time; arbitrary end
//! dates are not supported.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

use crate::error::{AwsopsError, Result};

/// Immutable time-selector configuration, passed by value into the
/// resolver and the cost fetcher. Replaces any notion of a shared
/// mutable option bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSelector {
    /// Charge window in days; when present and > 0 it wins over `months`
    pub days: Option<u32>,
    /// Number of trailing calendar months, 1 meaning the current month
    pub months: u32,
}

impl Default for PeriodSelector {
    fn default() -> Self {
        Self {
            days: None,
            months: 1,
        }
    }
}

impl PeriodSelector {
    /// Whether this selector is in day-count mode
    pub fn day_mode(&self) -> bool {
        self.days.is_some_and(|d| d > 0)
    }
}

/// A concrete `[start, end)` date range. Invariant: start ≤ end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Resolve a selector against today's date.
    pub fn resolve(selector: &PeriodSelector) -> Result<Self> {
        Self::resolve_at(selector, Utc::now().date_naive())
    }

    /// Resolve a selector against an explicit "today" (injectable for
    /// tests and deterministic replay).
    ///
    /// Day-count mode: `start = today - days`. Month mode: `start` is the
    /// first of the current month, shifted back `months - 1` months; when
    /// `months == 1` and today *is* the first of the month, `start` shifts
    /// back one full month instead, so month-boundary invocations report
    /// the just-finished month rather than an empty window.
    pub fn resolve_at(selector: &PeriodSelector, today: NaiveDate) -> Result<Self> {
        if let Some(days) = selector.days {
            if days > 0 {
                return Ok(Self {
                    start: today - Duration::days(i64::from(days)),
                    end: today,
                });
            }
        }

        if selector.months < 1 {
            return Err(AwsopsError::InvalidArgument(format!(
                "months must be >= 1, got {}",
                selector.months
            )));
        }

        let month_start = today
            .with_day(1)
            .expect("first of the month is a valid date");

        let start = if selector.months > 1 {
            month_start.checked_sub_months(Months::new(selector.months - 1))
        } else if month_start == today {
            month_start.checked_sub_months(Months::new(1))
        } else {
            Some(month_start)
        }
        .ok_or_else(|| {
            AwsopsError::InvalidArgument(format!("months {} out of range", selector.months))
        })?;

        Ok(Self { start, end: today })
    }

    /// Range start (inclusive)
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Range end (exclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start date as the wire format `YYYY-MM-DD`
    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End date as the wire format `YYYY-MM-DD`
    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}
