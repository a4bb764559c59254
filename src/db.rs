use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use progress_analytics::models::{
    BehaviorEvent, Goal, GoalDomain, GoalStatus, IncidentType, LessonPlan, LessonStatus, Severity,
    Student, SubjectArea,
};
use progress_analytics::Snapshot;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// One plan per seeded student, in student order.
const SEED_PLAN_IDS: [&str; 3] = [
    "e4dd61a8-1cc2-4b76-b3b1-56a214af0371",
    "49c316dc-66f9-4a77-b0f2-ebd752befce8",
    "64f60a24-94a4-4b90-80ae-ac8bf2a9bf0f",
];

/// (goal id, student index, domain, description, progress, status)
const SEED_GOALS: [(&str, usize, &str, &str, i32, &str); 5] = [
    (
        "cd55748f-0329-4eb3-a92f-0367b93f0a60",
        0,
        "Academic - Reading",
        "Reads grade-level passages at 90 wpm",
        100,
        "mastered",
    ),
    (
        "06eca136-7eb0-4468-95bb-46c346ac7780",
        0,
        "Communication",
        "Initiates peer conversation twice per class",
        45,
        "in_progress",
    ),
    (
        "596ce206-336f-419c-9c16-c7c309781299",
        1,
        "Academic - Math",
        "Solves two-step word problems",
        70,
        "in_progress",
    ),
    (
        "ae9e2fd5-e1fb-4c9a-9b42-840cbdf769d6",
        1,
        "Behavior",
        "Uses break card before escalation",
        0,
        "not_started",
    ),
    (
        "8197eb51-ac3a-4a6a-82f1-d1dd572d829e",
        2,
        "Social/Emotional",
        "Names feelings during check-in",
        25,
        "in_progress",
    ),
];

/// (lesson plan id, student index, title, subject, days ago, status)
const SEED_LESSON_PLANS: [(&str, Option<usize>, &str, &str, i64, &str); 4] = [
    ("637f36ea-0630-41a8-b089-f755b3130a43", Some(0), "Fluency warm-up", "Reading", 3, "completed"),
    ("d2b479fb-f217-4ae3-9292-c55542537d38", Some(1), "Fraction strips", "Math", 1, "in_progress"),
    (
        "94b1e85f-c016-4ed9-9391-29273be765a5",
        Some(2),
        "Feelings wheel",
        "Life Skills",
        -2,
        "planned",
    ),
    (
        "9b09efb3-5dc8-476a-8607-0d66aa3d774c",
        None,
        "Morning meeting template",
        "Communication",
        0,
        "planned",
    ),
];

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let organization = Uuid::parse_str("6a1c9e0e-5b7d-4f0a-9d61-2f8f3c2b7e11")?;
    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery",
            "Lee",
            "avery.lee@groupscholar.com",
            "6",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules",
            "Moreno",
            "jules.moreno@groupscholar.com",
            "8",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara",
            "Patel",
            "kiara.patel@groupscholar.com",
            "7",
        ),
    ];

    let today = Utc::now().date_naive();

    for (id, first_name, last_name, email, grade) in &students {
        sqlx::query(
            r#"
            INSERT INTO progress_analytics.students
            (id, first_name, last_name, email, grade_level, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                grade_level = EXCLUDED.grade_level
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(grade)
        .bind(organization)
        .execute(pool)
        .await?;
    }

    let plan_ids: Vec<Uuid> = SEED_PLAN_IDS
        .iter()
        .map(|id| Uuid::parse_str(id))
        .collect::<Result<_, _>>()?;

    for (plan_id, (student_id, ..)) in plan_ids.iter().zip(&students) {
        sqlx::query(
            r#"
            INSERT INTO progress_analytics.plans (id, student_id, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(plan_id)
        .bind(student_id)
        .bind(today - Duration::days(120))
        .bind(today + Duration::days(245))
        .execute(pool)
        .await?;
    }

    for (id, index, domain, description, progress, status) in SEED_GOALS {
        sqlx::query(
            r#"
            INSERT INTO progress_analytics.goals
            (id, plan_id, domain, description, progress, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(plan_ids[index])
        .bind(domain)
        .bind(description)
        .bind(progress)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let events = vec![
        ("seed-001", 0usize, 2i64, "10:30", "Disruptive", "Moderate", "Called out during math block"),
        ("seed-002", 1, 5, "14:15", "Non-Compliance", "Low", "Declined transition to reading"),
        ("seed-003", 1, 12, "09:05", "Verbal Outburst", "High", "Argued with peer at arrival"),
        ("seed-004", 2, 20, "19:00", "Withdrawal", "Low", "Left after-school group early"),
        ("seed-005", 0, 45, "11:45", "Positive", "Low", "Helped classmate with reading log"),
    ];

    for (source_key, index, days_ago, time, incident_type, severity, notes) in events {
        let occurred_at = NaiveDateTime::parse_from_str(
            &format!("{} {}", today - Duration::days(days_ago), time),
            "%Y-%m-%d %H:%M",
        )
        .context("invalid seed timestamp")?;

        sqlx::query(
            r#"
            INSERT INTO progress_analytics.behavior_events
            (id, student_id, occurred_at, incident_type, severity, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(students[index].0)
        .bind(occurred_at)
        .bind(incident_type)
        .bind(severity)
        .bind(notes)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    for (id, index, title, subject, days_ago, status) in SEED_LESSON_PLANS {
        sqlx::query(
            r#"
            INSERT INTO progress_analytics.lesson_plans
            (id, student_id, title, subject_area, scheduled_on, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(index.map(|i| students[i].0))
        .bind(title)
        .bind(subject)
        .bind(today - Duration::days(days_ago))
        .bind(status)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_events_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_id: Uuid,
        occurred_at: NaiveDateTime,
        incident_type: String,
        severity: String,
        notes: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO progress_analytics.behavior_events
            (id, student_id, occurred_at, incident_type, severity, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.student_id)
        .bind(row.occurred_at)
        .bind(&row.incident_type)
        .bind(&row.severity)
        .bind(&row.notes)
        .bind(source_key)
        .execute(pool)
        .await
        .with_context(|| format!("failed to import event for student {}", row.student_id))?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Stored progress is not range-checked by the record store.
fn clamp_progress(goal_id: Uuid, raw: i32) -> u8 {
    let clamped = raw.clamp(0, 100);
    if clamped != raw {
        tracing::warn!(%goal_id, raw, "goal progress outside 0-100, clamping");
    }
    clamped as u8
}

/// Materializes every entity in one pass, optionally scoped to one
/// organization. Lesson plan templates are only included when unscoped.
pub async fn fetch_snapshot(pool: &PgPool, organization: Option<Uuid>) -> anyhow::Result<Snapshot> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;

    let student_rows = sqlx::query(
        "SELECT id, first_name, last_name, grade_level, organization_id \
         FROM progress_analytics.students \
         WHERE $1::uuid IS NULL OR organization_id = $1",
    )
    .bind(organization)
    .fetch_all(&mut *tx)
    .await
    .context("failed to load students")?;

    let mut students = Vec::with_capacity(student_rows.len());
    for row in student_rows {
        students.push(Student {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            grade_level: row.try_get("grade_level")?,
            organization_id: row.try_get("organization_id")?,
        });
    }

    let goal_rows = sqlx::query(
        "SELECT g.id, g.plan_id, p.student_id, g.domain, g.progress, g.status \
         FROM progress_analytics.goals g \
         JOIN progress_analytics.plans p ON p.id = g.plan_id \
         JOIN progress_analytics.students s ON s.id = p.student_id \
         WHERE $1::uuid IS NULL OR s.organization_id = $1",
    )
    .bind(organization)
    .fetch_all(&mut *tx)
    .await
    .context("failed to load goals")?;

    let mut goals = Vec::with_capacity(goal_rows.len());
    for row in goal_rows {
        let id: Uuid = row.try_get("id")?;
        let domain: String = row.try_get("domain")?;
        let status: String = row.try_get("status")?;
        goals.push(Goal {
            id,
            plan_id: row.try_get("plan_id")?,
            student_id: row.try_get("student_id")?,
            domain: GoalDomain::from_label(&domain),
            progress: clamp_progress(id, row.try_get("progress")?),
            status: GoalStatus::from_label(&status),
        });
    }

    let event_rows = sqlx::query(
        "SELECT e.id, e.student_id, e.occurred_at, e.incident_type, e.severity, e.notes \
         FROM progress_analytics.behavior_events e \
         JOIN progress_analytics.students s ON s.id = e.student_id \
         WHERE $1::uuid IS NULL OR s.organization_id = $1",
    )
    .bind(organization)
    .fetch_all(&mut *tx)
    .await
    .context("failed to load behavior events")?;

    let mut behavior_events = Vec::with_capacity(event_rows.len());
    for row in event_rows {
        let incident_type: String = row.try_get("incident_type")?;
        let severity: String = row.try_get("severity")?;
        behavior_events.push(BehaviorEvent {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            occurred_at: row.try_get("occurred_at")?,
            incident_type: IncidentType::from_label(&incident_type),
            severity: Severity::from_label(&severity),
            notes: row.try_get("notes")?,
        });
    }

    let plan_rows = sqlx::query(
        "SELECT lp.id, lp.student_id, lp.subject_area, lp.scheduled_on, lp.status \
         FROM progress_analytics.lesson_plans lp \
         LEFT JOIN progress_analytics.students s ON s.id = lp.student_id \
         WHERE $1::uuid IS NULL OR s.organization_id = $1",
    )
    .bind(organization)
    .fetch_all(&mut *tx)
    .await
    .context("failed to load lesson plans")?;

    let mut lesson_plans = Vec::with_capacity(plan_rows.len());
    for row in plan_rows {
        let subject: String = row.try_get("subject_area")?;
        let status: String = row.try_get("status")?;
        let scheduled_on: NaiveDate = row.try_get("scheduled_on")?;
        lesson_plans.push(LessonPlan {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            subject: SubjectArea::from_label(&subject),
            scheduled_on,
            status: LessonStatus::from_label(&status),
        });
    }

    tx.commit().await?;

    tracing::info!(
        organization = ?organization,
        students = students.len(),
        goals = goals.len(),
        behavior_events = behavior_events.len(),
        lesson_plans = lesson_plans.len(),
        "loaded snapshot"
    );

    Ok(Snapshot {
        students,
        goals,
        behavior_events,
        lesson_plans,
    })
}
