//! Entity snapshot access.
//!
//! The aggregation core never talks to storage. Every entry point reads
//! through a [`SnapshotProvider`], which must hand back fully materialized
//! collections that stay consistent for the duration of one call.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{BehaviorEvent, Goal, GoalDomain, LessonPlan, Student};
use crate::window::DateWindow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalFilter {
    pub student_id: Option<Uuid>,
    pub domain: Option<GoalDomain>,
}

impl GoalFilter {
    pub fn matches(&self, goal: &Goal) -> bool {
        self.student_id.map_or(true, |id| goal.student_id == id)
            && self.domain.map_or(true, |domain| goal.domain == domain)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub student_id: Option<Uuid>,
    pub window: Option<DateWindow>,
}

impl EventFilter {
    pub fn matches(&self, event: &BehaviorEvent) -> bool {
        self.student_id.map_or(true, |id| event.student_id == id)
            && self
                .window
                .map_or(true, |window| window.contains(event.occurred_at.date()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonPlanFilter {
    pub student_id: Option<Uuid>,
    pub window: Option<DateWindow>,
}

impl LessonPlanFilter {
    pub fn matches(&self, plan: &LessonPlan) -> bool {
        self.student_id.map_or(true, |id| plan.student_id == Some(id))
            && self
                .window
                .map_or(true, |window| window.contains(plan.scheduled_on))
    }
}

pub trait SnapshotProvider {
    fn fetch_student(&self, id: Uuid) -> Result<Option<Student>>;
    fn fetch_students(&self) -> Result<Vec<Student>>;
    fn fetch_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>>;
    fn fetch_behavior_events(&self, filter: &EventFilter) -> Result<Vec<BehaviorEvent>>;
    fn fetch_lesson_plans(&self, filter: &LessonPlanFilter) -> Result<Vec<LessonPlan>>;
}

/// Immutable in-memory snapshot, typically loaded once from the database.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub goals: Vec<Goal>,
    pub behavior_events: Vec<BehaviorEvent>,
    pub lesson_plans: Vec<LessonPlan>,
}

impl SnapshotProvider for Snapshot {
    fn fetch_student(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.students.iter().find(|student| student.id == id).cloned())
    }

    fn fetch_students(&self) -> Result<Vec<Student>> {
        Ok(self.students.clone())
    }

    fn fetch_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>> {
        Ok(self
            .goals
            .iter()
            .filter(|goal| filter.matches(goal))
            .cloned()
            .collect())
    }

    fn fetch_behavior_events(&self, filter: &EventFilter) -> Result<Vec<BehaviorEvent>> {
        Ok(self
            .behavior_events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }

    fn fetch_lesson_plans(&self, filter: &LessonPlanFilter) -> Result<Vec<LessonPlan>> {
        Ok(self
            .lesson_plans
            .iter()
            .filter(|plan| filter.matches(plan))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LessonStatus, SubjectArea};
    use chrono::NaiveDate;

    fn plan(student_id: Option<Uuid>, day: u32) -> LessonPlan {
        LessonPlan {
            id: Uuid::new_v4(),
            student_id,
            subject: SubjectArea::Math,
            scheduled_on: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            status: LessonStatus::Planned,
        }
    }

    #[test]
    fn lesson_plan_filter_skips_templates_for_student_scope() {
        let student_id = Uuid::new_v4();
        let snapshot = Snapshot {
            lesson_plans: vec![plan(Some(student_id), 3), plan(None, 3), plan(Some(student_id), 20)],
            ..Default::default()
        };
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        )
        .unwrap();

        let scoped = snapshot
            .fetch_lesson_plans(&LessonPlanFilter {
                student_id: Some(student_id),
                window: Some(window),
            })
            .unwrap();
        assert_eq!(scoped.len(), 1);

        let all = snapshot.fetch_lesson_plans(&LessonPlanFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn unknown_student_resolves_to_none() {
        let snapshot = Snapshot::default();
        assert!(snapshot.fetch_student(Uuid::new_v4()).unwrap().is_none());
    }
}
