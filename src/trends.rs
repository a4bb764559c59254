use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::models::{BehaviorEvent, IncidentType, Severity};
use crate::patterns::events_in_window;
use crate::window::DateWindow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyBucket {
    pub total: usize,
    pub by_type: BTreeMap<IncidentType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Monday of the ISO week containing `date`. Saturates at `NaiveDate::MIN`
/// when that Monday is not representable.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(offset).unwrap_or(NaiveDate::MIN)
}

/// Buckets events by the Monday of their week. Weeks without events are
/// absent; keys iterate in ascending order.
pub fn compute_weekly_trends(
    events: &[BehaviorEvent],
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<BTreeMap<NaiveDate, WeeklyBucket>> {
    let window = DateWindow::new(from_date, to_date)?;
    Ok(bucket_by_week(events, window))
}

pub(crate) fn bucket_by_week(
    events: &[BehaviorEvent],
    window: DateWindow,
) -> BTreeMap<NaiveDate, WeeklyBucket> {
    let mut weeks: BTreeMap<NaiveDate, WeeklyBucket> = BTreeMap::new();

    for event in events_in_window(events, &window) {
        let bucket = weeks.entry(week_start(event.occurred_at.date())).or_default();
        bucket.total += 1;
        *bucket.by_type.entry(event.incident_type).or_insert(0) += 1;
        *bucket.by_severity.entry(event.severity).or_insert(0) += 1;
    }

    tracing::debug!(
        from = %window.from_date(),
        to = %window.to_date(),
        weeks = weeks.len(),
        "bucketed behavior events by week"
    );
    weeks
}
