use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};

/// Lookback for dashboard-scale views such as the student progress report
/// and the dashboard's recent-activity counters.
pub const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// Lookback for trend and pattern views.
pub const TREND_WINDOW_DAYS: i64 = 90;

/// Closed date interval `[from_date, to_date]`. Only constructed through
/// [`DateWindow::new`] or [`DateWindow::resolve`], so `from_date <= to_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    from_date: NaiveDate,
    to_date: NaiveDate,
}

impl DateWindow {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Result<Self> {
        if from_date > to_date {
            return Err(AnalyticsError::InvalidRange {
                from: from_date,
                to: to_date,
            });
        }
        Ok(Self { from_date, to_date })
    }

    /// Fills in missing bounds: `to_date` defaults to `today`, `from_date`
    /// to `default_days` before `to_date`.
    pub fn resolve(
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        default_days: i64,
        today: NaiveDate,
    ) -> Result<Self> {
        let to_date = to_date.unwrap_or(today);
        let from_date = match from_date {
            Some(date) => date,
            None => days_before(to_date, default_days).ok_or(AnalyticsError::InvalidRange {
                from: NaiveDate::MIN,
                to: to_date,
            })?,
        };
        Self::new(from_date, to_date)
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `None` when the result falls outside chrono's date range.
pub fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_sub_signed(delta))
}

/// Saturates at `NaiveDate::MIN`, which keeps every dated record.
pub fn cutoff_date(today: NaiveDate, days: i64) -> NaiveDate {
    days_before(today, days).unwrap_or(NaiveDate::MIN)
}
