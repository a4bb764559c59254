use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{BehaviorEvent, IncidentType, Severity};
use crate::window::DateWindow;

pub const TOP_STUDENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// Fixed time-of-day banding: mornings run 06:00-11:59, afternoons
/// 12:00-17:59, and every other hour counts as evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TimeBand {
    Morning,
    Afternoon,
    Evening,
}

impl TimeBand {
    pub fn of(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentEventCount {
    pub student_id: Uuid,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternBreakdown {
    pub period: DateWindow,
    pub total_events: usize,
    pub by_day_of_week: BTreeMap<DayOfWeek, usize>,
    pub by_time_of_day: BTreeMap<TimeBand, usize>,
    pub by_type: BTreeMap<IncidentType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Most frequent students, at most [`TOP_STUDENT_LIMIT`] entries.
    pub by_student: Vec<StudentEventCount>,
}

pub(crate) fn events_in_window<'a>(
    events: &'a [BehaviorEvent],
    window: &DateWindow,
) -> impl Iterator<Item = &'a BehaviorEvent> + 'a {
    let window = *window;
    events
        .iter()
        .filter(move |event| window.contains(event.occurred_at.date()))
}

pub fn compute_behavior_patterns(
    events: &[BehaviorEvent],
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<PatternBreakdown> {
    let window = DateWindow::new(from_date, to_date)?;
    Ok(analyze_patterns(events, window))
}

pub(crate) fn analyze_patterns(events: &[BehaviorEvent], window: DateWindow) -> PatternBreakdown {
    let mut breakdown = PatternBreakdown {
        period: window,
        total_events: 0,
        by_day_of_week: BTreeMap::new(),
        by_time_of_day: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_severity: BTreeMap::new(),
        by_student: Vec::new(),
    };
    let mut per_student: HashMap<Uuid, usize> = HashMap::new();

    for event in events_in_window(events, &window) {
        breakdown.total_events += 1;
        let day = DayOfWeek::from(event.occurred_at.date().weekday());
        *breakdown.by_day_of_week.entry(day).or_insert(0) += 1;
        let band = TimeBand::of(event.occurred_at.hour());
        *breakdown.by_time_of_day.entry(band).or_insert(0) += 1;
        *breakdown.by_type.entry(event.incident_type).or_insert(0) += 1;
        *breakdown.by_severity.entry(event.severity).or_insert(0) += 1;
        *per_student.entry(event.student_id).or_insert(0) += 1;
    }

    breakdown.by_student = top_students(per_student, TOP_STUDENT_LIMIT);

    tracing::debug!(
        from = %window.from_date(),
        to = %window.to_date(),
        total_events = breakdown.total_events,
        students = breakdown.by_student.len(),
        "computed behavior patterns"
    );
    breakdown
}

/// Highest counts first; equal counts fall back to ascending student id so
/// the cut at `limit` is deterministic.
fn top_students(counts: HashMap<Uuid, usize>, limit: usize) -> Vec<StudentEventCount> {
    let mut ranked: Vec<StudentEventCount> = counts
        .into_iter()
        .map(|(student_id, count)| StudentEventCount { student_id, count })
        .collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    ranked.truncate(limit);
    ranked
}
