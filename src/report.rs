use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AnalyticsError, Result};
use crate::metrics::{
    compute_domain_breakdown, compute_goal_metrics, rank_student_performance, tally_lesson_plans,
    DomainBreakdown, GoalMetrics, LessonPlanTally, StudentPerformance,
};
use crate::models::{GoalDomain, Student};
use crate::patterns::{analyze_patterns, PatternBreakdown};
use crate::snapshot::{EventFilter, GoalFilter, LessonPlanFilter, SnapshotProvider};
use crate::trends::{bucket_by_week, WeeklyBucket};
use crate::window::DateWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub student: Student,
    pub period: DateWindow,
    /// Current goal standing; not limited to `period`.
    pub goal_progress: GoalMetrics,
    pub goals_by_domain: BTreeMap<GoalDomain, GoalMetrics>,
    pub behavior: PatternBreakdown,
    pub weekly_trends: BTreeMap<NaiveDate, WeeklyBucket>,
    pub lesson_plans: LessonPlanTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationReport {
    pub period: DateWindow,
    pub goals: DomainBreakdown,
    pub performance: Vec<StudentPerformance>,
    pub behavior: PatternBreakdown,
    pub weekly_trends: BTreeMap<NaiveDate, WeeklyBucket>,
    pub lesson_plans: LessonPlanTally,
}

#[tracing::instrument(skip(provider), fields(from = %from_date, to = %to_date))]
pub fn compose_student_report<P: SnapshotProvider + ?Sized>(
    provider: &P,
    student_id: Uuid,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<StudentReport> {
    let window = DateWindow::new(from_date, to_date)?;
    let Some(student) = provider.fetch_student(student_id)? else {
        tracing::warn!(%student_id, "student not found");
        return Err(AnalyticsError::NotFound {
            entity: "student",
            id: student_id.to_string(),
        });
    };

    let goals = provider.fetch_goals(&GoalFilter {
        student_id: Some(student_id),
        domain: None,
    })?;
    let events = provider.fetch_behavior_events(&EventFilter {
        student_id: Some(student_id),
        window: Some(window),
    })?;
    let plans = provider.fetch_lesson_plans(&LessonPlanFilter {
        student_id: Some(student_id),
        window: Some(window),
    })?;

    let report = StudentReport {
        goal_progress: compute_goal_metrics(&goals),
        goals_by_domain: compute_domain_breakdown(&goals).by_domain,
        behavior: analyze_patterns(&events, window),
        weekly_trends: bucket_by_week(&events, window),
        lesson_plans: tally_lesson_plans(&plans),
        student,
        period: window,
    };

    tracing::info!(
        goals = report.goal_progress.total,
        incidents = report.behavior.total_events,
        lesson_plans = report.lesson_plans.total,
        "composed student report"
    );
    Ok(report)
}

#[tracing::instrument(skip(provider), fields(from = %from_date, to = %to_date))]
pub fn compose_organization_report<P: SnapshotProvider + ?Sized>(
    provider: &P,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<OrganizationReport> {
    let window = DateWindow::new(from_date, to_date)?;
    let students = provider.fetch_students()?;
    let goals = provider.fetch_goals(&GoalFilter::default())?;
    let events = provider.fetch_behavior_events(&EventFilter {
        student_id: None,
        window: Some(window),
    })?;
    let plans = provider.fetch_lesson_plans(&LessonPlanFilter {
        student_id: None,
        window: Some(window),
    })?;

    let report = OrganizationReport {
        period: window,
        goals: compute_domain_breakdown(&goals),
        performance: rank_student_performance(&students, &goals),
        behavior: analyze_patterns(&events, window),
        weekly_trends: bucket_by_week(&events, window),
        lesson_plans: tally_lesson_plans(&plans),
    };

    tracing::info!(
        students = students.len(),
        goals = report.goals.overall.total,
        incidents = report.behavior.total_events,
        "composed organization report"
    );
    Ok(report)
}

/// Map entries ordered by descending count, then by key.
fn ranked_counts<K: Copy + Ord>(counts: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.iter().map(|(key, count)| (*key, *count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn write_goal_section(
    output: &mut String,
    metrics: &GoalMetrics,
    by_domain: &BTreeMap<GoalDomain, GoalMetrics>,
) {
    let _ = writeln!(output, "## Goal Progress");

    if metrics.total == 0 {
        let _ = writeln!(output, "No goals recorded.");
        return;
    }

    let _ = writeln!(
        output,
        "- {} goals: {} met, {} in progress, {} not started",
        metrics.total, metrics.completed, metrics.in_progress, metrics.not_started
    );
    let _ = writeln!(
        output,
        "- Average progress {:.2}% (completion rate {:.2}%)",
        metrics.average_progress, metrics.completion_rate
    );
    for (domain, domain_metrics) in by_domain {
        let _ = writeln!(
            output,
            "- {}: {} goals, avg {:.2}%, {} met",
            domain.label(),
            domain_metrics.total,
            domain_metrics.average_progress,
            domain_metrics.completed
        );
    }
}

fn write_behavior_section(
    output: &mut String,
    behavior: &PatternBreakdown,
    weekly_trends: &BTreeMap<NaiveDate, WeeklyBucket>,
) {
    let _ = writeln!(output, "## Incident Mix");

    if behavior.total_events == 0 {
        let _ = writeln!(output, "No incidents recorded for this window.");
    } else {
        let _ = writeln!(output, "{} incidents in window.", behavior.total_events);
        for (incident_type, count) in ranked_counts(&behavior.by_type) {
            let _ = writeln!(output, "- {}: {} incidents", incident_type.label(), count);
        }
        for (severity, count) in &behavior.by_severity {
            let _ = writeln!(output, "- Severity {}: {}", severity.label(), count);
        }
        for (band, count) in &behavior.by_time_of_day {
            let _ = writeln!(output, "- {band:?}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Trend");

    if weekly_trends.is_empty() {
        let _ = writeln!(output, "No incidents recorded for this window.");
    } else {
        for (week, bucket) in weekly_trends {
            let _ = writeln!(output, "- Week of {}: {} incidents", week, bucket.total);
        }
    }
}

fn write_lesson_section(output: &mut String, plans: &LessonPlanTally) {
    let _ = writeln!(output, "## Lesson Plans");

    if plans.total == 0 {
        let _ = writeln!(output, "No lesson plans recorded for this window.");
        return;
    }

    let _ = writeln!(
        output,
        "- {} plans: {} completed, {} in progress, {} planned",
        plans.total, plans.completed, plans.in_progress, plans.planned
    );
    for (subject, count) in ranked_counts(&plans.by_subject) {
        let _ = writeln!(output, "- {}: {}", subject.label(), count);
    }
}

pub fn render_student_report(report: &StudentReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {})",
        report.student.full_name(),
        report.period.from_date(),
        report.period.to_date()
    );
    let _ = writeln!(output);
    write_goal_section(&mut output, &report.goal_progress, &report.goals_by_domain);
    let _ = writeln!(output);
    write_behavior_section(&mut output, &report.behavior, &report.weekly_trends);
    let _ = writeln!(output);
    write_lesson_section(&mut output, &report.lesson_plans);

    output
}

pub fn render_organization_report(report: &OrganizationReport, label: Option<&str>) -> String {
    let mut output = String::new();
    let scope = label.unwrap_or("all students");

    let _ = writeln!(output, "# Progress Analytics Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {})",
        scope, report.period.from_date(), report.period.to_date()
    );
    let _ = writeln!(output);
    write_goal_section(&mut output, &report.goals.overall, &report.goals.by_domain);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Student Performance");

    if report.performance.is_empty() {
        let _ = writeln!(output, "No students in scope.");
    } else {
        for row in report.performance.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} avg {:.2}% across {} goals ({} met)",
                row.name, row.average_progress, row.total_goals, row.completed_goals
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Frequent Incidents by Student");

    if report.behavior.by_student.is_empty() {
        let _ = writeln!(output, "No incidents recorded for this window.");
    } else {
        for entry in &report.behavior.by_student {
            let _ = writeln!(output, "- {}: {} incidents", entry.student_id, entry.count);
        }
    }

    let _ = writeln!(output);
    write_behavior_section(&mut output, &report.behavior, &report.weekly_trends);
    let _ = writeln!(output);
    write_lesson_section(&mut output, &report.lesson_plans);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BehaviorEvent, Goal, GoalStatus, IncidentType, LessonPlan, LessonStatus, Severity,
        SubjectArea,
    };
    use crate::snapshot::Snapshot;
    use chrono::NaiveDateTime;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn student(id: Uuid, first_name: &str) -> Student {
        Student {
            id,
            first_name: first_name.to_string(),
            last_name: "Moreno".to_string(),
            grade_level: Some("7".to_string()),
            organization_id: None,
        }
    }

    fn goal(student_id: Uuid, domain: GoalDomain, progress: u8) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            student_id,
            domain,
            progress,
            status: GoalStatus::NotStarted,
        }
    }

    fn event(student_id: Uuid, occurred_at: &str) -> BehaviorEvent {
        BehaviorEvent {
            id: Uuid::new_v4(),
            student_id,
            occurred_at: NaiveDateTime::parse_from_str(occurred_at, "%Y-%m-%d %H:%M").unwrap(),
            incident_type: IncidentType::VerbalOutburst,
            severity: Severity::Low,
            notes: Some("raised voice during group work".to_string()),
        }
    }

    fn plan(student_id: Option<Uuid>, scheduled_on: &str, status: LessonStatus) -> LessonPlan {
        LessonPlan {
            id: Uuid::new_v4(),
            student_id,
            subject: SubjectArea::Reading,
            scheduled_on: date(scheduled_on),
            status,
        }
    }

    fn sample_snapshot(jules: Uuid, kiara: Uuid) -> Snapshot {
        Snapshot {
            students: vec![student(jules, "Jules"), student(kiara, "Kiara")],
            goals: vec![
                goal(jules, GoalDomain::AcademicReading, 100),
                goal(jules, GoalDomain::Communication, 20),
                goal(kiara, GoalDomain::AcademicMath, 70),
            ],
            behavior_events: vec![
                event(jules, "2026-03-03 09:15"),
                event(jules, "2026-03-10 13:40"),
                event(jules, "2026-01-05 10:00"),
                event(kiara, "2026-03-04 10:00"),
            ],
            lesson_plans: vec![
                plan(Some(jules), "2026-03-05", LessonStatus::Completed),
                plan(Some(jules), "2026-03-12", LessonStatus::Planned),
                plan(Some(jules), "2025-12-01", LessonStatus::Completed),
                plan(None, "2026-03-05", LessonStatus::Planned),
            ],
        }
    }

    #[test]
    fn unknown_student_is_not_found() {
        crate::logging::init_test();
        let snapshot = sample_snapshot(Uuid::new_v4(), Uuid::new_v4());
        let missing = Uuid::new_v4();
        let (from, to) = (date("2026-03-01"), date("2026-03-31"));

        let err = compose_student_report(&snapshot, missing, from, to).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::NotFound {
                entity: "student",
                id: missing.to_string()
            }
        );
    }

    #[test]
    fn student_report_scopes_events_and_plans_but_not_goals() {
        let jules = Uuid::new_v4();
        let kiara = Uuid::new_v4();
        let snapshot = sample_snapshot(jules, kiara);
        let (from, to) = (date("2026-03-01"), date("2026-03-31"));

        let report = compose_student_report(&snapshot, jules, from, to).unwrap();
        assert_eq!(report.student.id, jules);
        assert_eq!(report.goal_progress.total, 2);
        assert_eq!(report.goal_progress.average_progress, 60.0);
        assert_eq!(report.goals_by_domain.len(), 2);
        assert_eq!(report.behavior.total_events, 2);
        assert_eq!(report.behavior.by_type[&IncidentType::VerbalOutburst], 2);
        assert_eq!(report.weekly_trends.len(), 2);
        assert_eq!(report.lesson_plans.total, 2);
        assert_eq!(report.lesson_plans.completed, 1);
        assert_eq!(report.lesson_plans.planned, 1);
    }

    #[test]
    fn organization_report_covers_every_student() {
        let jules = Uuid::new_v4();
        let kiara = Uuid::new_v4();
        let snapshot = sample_snapshot(jules, kiara);
        let (from, to) = (date("2026-03-01"), date("2026-03-31"));

        let report = compose_organization_report(&snapshot, from, to).unwrap();
        assert_eq!(report.goals.overall.total, 3);
        assert_eq!(report.performance.len(), 2);
        assert_eq!(report.performance[0].student_id, kiara);
        assert_eq!(report.behavior.total_events, 3);
        assert_eq!(report.lesson_plans.total, 3);
    }

    #[test]
    fn student_report_rejects_inverted_range() {
        let jules = Uuid::new_v4();
        let snapshot = sample_snapshot(jules, Uuid::new_v4());

        let err =
            compose_student_report(&snapshot, jules, date("2026-03-31"), date("2026-03-01"))
                .unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::InvalidRange {
                from: date("2026-03-31"),
                to: date("2026-03-01")
            }
        );
    }

    #[test]
    fn organization_report_rejects_inverted_range() {
        let snapshot = sample_snapshot(Uuid::new_v4(), Uuid::new_v4());

        let result = compose_organization_report(&snapshot, date("2026-04-01"), date("2026-03-01"));
        assert!(matches!(result, Err(AnalyticsError::InvalidRange { .. })));
    }

    #[test]
    fn concurrent_reports_agree() {
        let jules = Uuid::new_v4();
        let snapshot = sample_snapshot(jules, Uuid::new_v4());
        let (from, to) = (date("2026-03-01"), date("2026-03-31"));
        let expected = compose_student_report(&snapshot, jules, from, to).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| compose_student_report(&snapshot, jules, from, to)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), expected);
            }
        });
    }

    #[test]
    fn markdown_lists_sections_and_empty_states() {
        let jules = Uuid::new_v4();
        let snapshot = Snapshot {
            students: vec![student(jules, "Jules")],
            ..Default::default()
        };
        let (from, to) = (date("2026-03-01"), date("2026-03-31"));
        let report = compose_student_report(&snapshot, jules, from, to).unwrap();

        let markdown = render_student_report(&report);
        assert!(markdown.starts_with("# Student Progress Report"));
        assert!(markdown.contains("Generated for Jules Moreno (2026-03-01 to 2026-03-31)"));
        assert!(markdown.contains("No goals recorded."));
        assert!(markdown.contains("No incidents recorded for this window."));
        assert!(markdown.contains("No lesson plans recorded for this window."));
    }

    #[test]
    fn markdown_orders_incident_mix_by_count() {
        let mut counts = BTreeMap::new();
        counts.insert(IncidentType::Aggressive, 1);
        counts.insert(IncidentType::Withdrawal, 4);
        counts.insert(IncidentType::Disruptive, 4);
        let ranked = ranked_counts(&counts);
        assert_eq!(
            ranked,
            vec![
                (IncidentType::Disruptive, 4),
                (IncidentType::Withdrawal, 4),
                (IncidentType::Aggressive, 1)
            ]
        );
    }
}
