use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Goal, GoalDomain, LessonPlan, LessonStatus, ProgressClass, Student, SubjectArea};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressHistogram {
    #[serde(rename = "0%")]
    pub zero: usize,
    #[serde(rename = "1-25%")]
    pub up_to_25: usize,
    #[serde(rename = "26-50%")]
    pub up_to_50: usize,
    #[serde(rename = "51-75%")]
    pub up_to_75: usize,
    #[serde(rename = "76-99%")]
    pub up_to_99: usize,
    #[serde(rename = "100%")]
    pub complete: usize,
}

impl ProgressHistogram {
    fn record(&mut self, progress: u8) {
        match progress {
            0 => self.zero += 1,
            1..=25 => self.up_to_25 += 1,
            26..=50 => self.up_to_50 += 1,
            51..=75 => self.up_to_75 += 1,
            76..=99 => self.up_to_99 += 1,
            _ => self.complete += 1,
        }
    }

    pub fn sum(&self) -> usize {
        self.zero + self.up_to_25 + self.up_to_50 + self.up_to_75 + self.up_to_99 + self.complete
    }
}

/// Goal counts and progress statistics. `average_progress` is 0 for an
/// empty collection; check `total` to tell "no data" from "no progress".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GoalMetrics {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub average_progress: f64,
    pub completion_rate: f64,
    pub distribution: ProgressHistogram,
}

#[derive(Debug, Clone, Copy, Default)]
struct GoalTally {
    total: usize,
    completed: usize,
    in_progress: usize,
    not_started: usize,
    progress_sum: u64,
    distribution: ProgressHistogram,
}

impl GoalTally {
    fn record(&mut self, goal: &Goal) {
        self.total += 1;
        self.progress_sum += u64::from(goal.progress);
        self.distribution.record(goal.progress);
        match goal.classification() {
            ProgressClass::Completed => self.completed += 1,
            ProgressClass::InProgress => self.in_progress += 1,
            ProgressClass::NotStarted => self.not_started += 1,
        }
    }

    fn finish(self) -> GoalMetrics {
        let (average_progress, completion_rate) = if self.total == 0 {
            (0.0, 0.0)
        } else {
            let total = self.total as f64;
            (
                round2(self.progress_sum as f64 / total),
                round2(self.completed as f64 / total * 100.0),
            )
        };

        GoalMetrics {
            total: self.total,
            completed: self.completed,
            in_progress: self.in_progress,
            not_started: self.not_started,
            average_progress,
            completion_rate,
            distribution: self.distribution,
        }
    }
}

/// Two decimals, halves going to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn compute_goal_metrics(goals: &[Goal]) -> GoalMetrics {
    let mut tally = GoalTally::default();
    for goal in goals {
        tally.record(goal);
    }
    let metrics = tally.finish();
    tracing::debug!(
        total = metrics.total,
        completed = metrics.completed,
        average_progress = metrics.average_progress,
        "computed goal metrics"
    );
    metrics
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainBreakdown {
    pub by_domain: BTreeMap<GoalDomain, GoalMetrics>,
    pub overall: GoalMetrics,
}

pub fn compute_domain_breakdown(goals: &[Goal]) -> DomainBreakdown {
    let mut tallies: BTreeMap<GoalDomain, GoalTally> = BTreeMap::new();
    let mut overall = GoalTally::default();

    for goal in goals {
        tallies.entry(goal.domain).or_default().record(goal);
        overall.record(goal);
    }

    DomainBreakdown {
        by_domain: tallies
            .into_iter()
            .map(|(domain, tally)| (domain, tally.finish()))
            .collect(),
        overall: overall.finish(),
    }
}

/// One row of the ranked performance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPerformance {
    pub student_id: Uuid,
    pub name: String,
    pub total_goals: usize,
    pub completed_goals: usize,
    pub average_progress: f64,
}

/// Ranks every student by average goal progress, highest first, ties by
/// ascending student id. Students without goals are listed at 0. Goals
/// whose owner is not among `students` are ignored.
pub fn rank_student_performance(students: &[Student], goals: &[Goal]) -> Vec<StudentPerformance> {
    let mut tallies: HashMap<Uuid, GoalTally> = students
        .iter()
        .map(|student| (student.id, GoalTally::default()))
        .collect();

    for goal in goals {
        if let Some(tally) = tallies.get_mut(&goal.student_id) {
            tally.record(goal);
        }
    }

    let mut rows: Vec<StudentPerformance> = students
        .iter()
        .map(|student| {
            let metrics = tallies
                .get(&student.id)
                .copied()
                .unwrap_or_default()
                .finish();
            StudentPerformance {
                student_id: student.id,
                name: student.full_name(),
                total_goals: metrics.total,
                completed_goals: metrics.completed,
                average_progress: metrics.average_progress,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.average_progress
            .total_cmp(&a.average_progress)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    rows
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LessonPlanTally {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub planned: usize,
    pub other: usize,
    pub by_subject: BTreeMap<SubjectArea, usize>,
}

pub fn tally_lesson_plans(plans: &[LessonPlan]) -> LessonPlanTally {
    let mut tally = LessonPlanTally::default();
    for plan in plans {
        tally.total += 1;
        match plan.status {
            LessonStatus::Completed => tally.completed += 1,
            LessonStatus::InProgress => tally.in_progress += 1,
            LessonStatus::Planned => tally.planned += 1,
            LessonStatus::Other => tally.other += 1,
        }
        *tally.by_subject.entry(plan.subject).or_insert(0) += 1;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalStatus;
    use chrono::NaiveDate;

    fn goal(student_id: Uuid, domain: GoalDomain, progress: u8) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            student_id,
            domain,
            progress,
            status: GoalStatus::InProgress,
        }
    }

    fn student(id: Uuid, first_name: &str) -> Student {
        Student {
            id,
            first_name: first_name.to_string(),
            last_name: "Lee".to_string(),
            grade_level: None,
            organization_id: None,
        }
    }

    fn progress_goals(values: &[u8]) -> Vec<Goal> {
        let owner = Uuid::new_v4();
        values
            .iter()
            .map(|progress| goal(owner, GoalDomain::AcademicMath, *progress))
            .collect()
    }

    #[test]
    fn three_goal_scenario_matches_expected_counts() {
        let metrics = compute_goal_metrics(&progress_goals(&[0, 50, 100]));
        assert_eq!(metrics.total, 3);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.in_progress, 1);
        assert_eq!(metrics.not_started, 1);
        assert_eq!(metrics.average_progress, 50.0);
        assert_eq!(metrics.completion_rate, 33.33);
    }

    #[test]
    fn halfway_averages_round_to_even() {
        let metrics = compute_goal_metrics(&progress_goals(&[1, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(metrics.average_progress, 0.12);

        let metrics = compute_goal_metrics(&progress_goals(&[5, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(metrics.average_progress, 0.62);

        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn empty_collection_reports_zeroes() {
        let metrics = compute_goal_metrics(&[]);
        assert_eq!(metrics, GoalMetrics::default());
        assert_eq!(metrics.average_progress, 0.0);
        assert_eq!(metrics.completion_rate, 0.0);
    }

    #[test]
    fn histogram_bucket_edges_are_inclusive() {
        let metrics = compute_goal_metrics(&progress_goals(&[0, 1, 25, 26, 50, 51, 75, 76, 99, 100]));
        let histogram = metrics.distribution;
        assert_eq!(histogram.zero, 1);
        assert_eq!(histogram.up_to_25, 2);
        assert_eq!(histogram.up_to_50, 2);
        assert_eq!(histogram.up_to_75, 2);
        assert_eq!(histogram.up_to_99, 2);
        assert_eq!(histogram.complete, 1);
        assert_eq!(histogram.sum(), metrics.total);
    }

    #[test]
    fn counts_and_average_stay_consistent() {
        let samples: [&[u8]; 4] = [&[], &[100, 100], &[0, 0, 7], &[3, 44, 81, 100, 0, 62, 19]];
        for values in samples {
            let metrics = compute_goal_metrics(&progress_goals(values));
            assert_eq!(
                metrics.completed + metrics.in_progress + metrics.not_started,
                metrics.total
            );
            assert_eq!(metrics.distribution.sum(), metrics.total);
            assert!((0.0..=100.0).contains(&metrics.average_progress));
        }
    }

    #[test]
    fn domain_breakdown_groups_and_summarizes() {
        let owner = Uuid::new_v4();
        let goals = vec![
            goal(owner, GoalDomain::AcademicReading, 100),
            goal(owner, GoalDomain::AcademicReading, 40),
            goal(owner, GoalDomain::Communication, 0),
        ];

        let breakdown = compute_domain_breakdown(&goals);
        assert_eq!(breakdown.by_domain.len(), 2);

        let reading = &breakdown.by_domain[&GoalDomain::AcademicReading];
        assert_eq!(reading.total, 2);
        assert_eq!(reading.average_progress, 70.0);
        assert_eq!(reading.completion_rate, 50.0);

        let communication = &breakdown.by_domain[&GoalDomain::Communication];
        assert_eq!(communication.not_started, 1);

        assert_eq!(breakdown.overall.total, 3);
        assert_eq!(breakdown.overall.average_progress, 46.67);
    }

    #[test]
    fn performance_ranks_by_average_then_id() {
        let low_id = Uuid::from_u128(1);
        let high_id = Uuid::from_u128(2);
        let leader = Uuid::from_u128(3);
        let idle = Uuid::from_u128(4);
        let students = vec![
            student(idle, "Idle"),
            student(high_id, "Tie B"),
            student(low_id, "Tie A"),
            student(leader, "Leader"),
        ];
        let goals = vec![
            goal(leader, GoalDomain::Behavior, 90),
            goal(low_id, GoalDomain::Behavior, 60),
            goal(high_id, GoalDomain::Behavior, 40),
            goal(high_id, GoalDomain::Behavior, 80),
            goal(Uuid::from_u128(99), GoalDomain::Behavior, 100),
        ];

        let ranked = rank_student_performance(&students, &goals);
        let order: Vec<Uuid> = ranked.iter().map(|row| row.student_id).collect();
        assert_eq!(order, vec![leader, low_id, high_id, idle]);
        assert_eq!(ranked[2].total_goals, 2);
        assert_eq!(ranked[3].total_goals, 0);
        assert_eq!(ranked[3].average_progress, 0.0);
        assert_eq!(ranked[0].name, "Leader Lee");
    }

    #[test]
    fn lesson_plans_tally_by_status_and_subject() {
        let scheduled_on = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let plan = |subject, status| LessonPlan {
            id: Uuid::new_v4(),
            student_id: None,
            subject,
            scheduled_on,
            status,
        };
        let plans = vec![
            plan(SubjectArea::Reading, LessonStatus::Completed),
            plan(SubjectArea::Reading, LessonStatus::Planned),
            plan(SubjectArea::Math, LessonStatus::InProgress),
            plan(SubjectArea::Other, LessonStatus::Other),
        ];

        let tally = tally_lesson_plans(&plans);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.completed, 1);
        assert_eq!(tally.in_progress, 1);
        assert_eq!(tally.planned, 1);
        assert_eq!(tally.other, 1);
        assert_eq!(tally.by_subject[&SubjectArea::Reading], 2);
    }
}
