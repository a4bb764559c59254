//! Analytics and reporting aggregation for student progress records.
//!
//! Every entry point is a pure computation over a materialized snapshot:
//! goal metrics, behavior pattern breakdowns, weekly trend buckets,
//! composed student/organization reports, and the dashboard summary.

pub mod dashboard;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod patterns;
pub mod report;
pub mod snapshot;
pub mod trends;
pub mod window;

pub use dashboard::{compute_dashboard_summary, DashboardSummary};
pub use error::{AnalyticsError, Result};
pub use metrics::{
    compute_domain_breakdown, compute_goal_metrics, rank_student_performance, tally_lesson_plans,
    DomainBreakdown, GoalMetrics, LessonPlanTally, StudentPerformance,
};
pub use patterns::{compute_behavior_patterns, PatternBreakdown};
pub use report::{
    compose_organization_report, compose_student_report, OrganizationReport, StudentReport,
};
pub use snapshot::{Snapshot, SnapshotProvider};
pub use trends::{compute_weekly_trends, WeeklyBucket};
pub use window::DateWindow;
