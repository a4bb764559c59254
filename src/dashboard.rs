use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::metrics::compute_goal_metrics;
use crate::snapshot::{EventFilter, GoalFilter, LessonPlanFilter, SnapshotProvider};
use crate::window::{cutoff_date, DASHBOARD_WINDOW_DAYS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub students: usize,
    pub goals: usize,
    pub behavior_events: usize,
    pub lesson_plans: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub behavior_events_30d: usize,
    pub lesson_plans_30d: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GoalProgressSummary {
    pub completed_goals: usize,
    pub average_progress: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub totals: Totals,
    pub recent_activity: RecentActivity,
    pub goal_progress: GoalProgressSummary,
}

/// Landing-view counters over everything the provider exposes. Recent
/// activity counts records dated on or after `today - 30 days`.
pub fn compute_dashboard_summary<P: SnapshotProvider + ?Sized>(
    provider: &P,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let students = provider.fetch_students()?;
    let goals = provider.fetch_goals(&GoalFilter::default())?;
    let events = provider.fetch_behavior_events(&EventFilter::default())?;
    let plans = provider.fetch_lesson_plans(&LessonPlanFilter::default())?;

    let since = cutoff_date(today, DASHBOARD_WINDOW_DAYS);
    let goal_metrics = compute_goal_metrics(&goals);

    let summary = DashboardSummary {
        totals: Totals {
            students: students.len(),
            goals: goals.len(),
            behavior_events: events.len(),
            lesson_plans: plans.len(),
        },
        recent_activity: RecentActivity {
            behavior_events_30d: events
                .iter()
                .filter(|event| event.occurred_at.date() >= since)
                .count(),
            lesson_plans_30d: plans.iter().filter(|plan| plan.scheduled_on >= since).count(),
        },
        goal_progress: GoalProgressSummary {
            completed_goals: goal_metrics.completed,
            average_progress: goal_metrics.average_progress,
        },
    };

    tracing::debug!(
        students = summary.totals.students,
        goals = summary.totals.goals,
        since = %since,
        "computed dashboard summary"
    );
    Ok(summary)
}
