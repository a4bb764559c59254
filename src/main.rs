use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use progress_analytics::models::GoalDomain;
use progress_analytics::snapshot::{EventFilter, GoalFilter, SnapshotProvider};
use progress_analytics::window::{self, DateWindow, DASHBOARD_WINDOW_DAYS, TREND_WINDOW_DAYS};
use progress_analytics::{logging, report};

mod config;
mod db;

#[derive(Parser)]
#[command(name = "progress-analytics")]
#[command(about = "Goal, behavior, and lesson-plan analytics for student progress records", long_about = None)]
struct Cli {
    /// Restrict the snapshot to one organization
    #[arg(long, global = true)]
    organization: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import behavior events from a CSV file
    ImportEvents {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Landing-page counters
    Dashboard,
    /// Goal progress metrics broken down by domain
    Goals {
        #[arg(long, value_parser = parse_domain)]
        domain: Option<GoalDomain>,
        #[arg(long)]
        student: Option<Uuid>,
    },
    /// Students ranked by average goal progress
    Performance {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Behavior incidents grouped by weekday, time of day, type, severity and student
    Patterns {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Weekly behavior incident buckets
    Trends {
        #[arg(long)]
        student: Option<Uuid>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Progress report for one student
    Report {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Organization-wide progress report
    OrgReport {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_domain(value: &str) -> Result<GoalDomain, String> {
    GoalDomain::parse(value).ok_or_else(|| format!("unknown goal domain `{value}`"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit(output: String, out: Option<PathBuf>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = config::Settings::from_env()?;
    logging::init(&settings.log_level);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let today = window::today();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportEvents { csv } => {
            let inserted = db::import_events_csv(&pool, &csv).await?;
            println!("Inserted {inserted} behavior events from {}.", csv.display());
        }
        Commands::Dashboard => {
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let summary = progress_analytics::compute_dashboard_summary(&snapshot, today)?;
            print_json(&summary)?;
        }
        Commands::Goals { domain, student } => {
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let goals = snapshot.fetch_goals(&GoalFilter {
                student_id: student,
                domain,
            })?;
            print_json(&progress_analytics::compute_domain_breakdown(&goals))?;
        }
        Commands::Performance { limit } => {
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let ranked =
                progress_analytics::rank_student_performance(&snapshot.students, &snapshot.goals);

            if ranked.is_empty() {
                println!("No students found.");
                return Ok(());
            }

            println!("Students by average goal progress:");
            for row in ranked.iter().take(limit) {
                println!(
                    "- {} ({}) avg {:.2}% across {} goals, {} met",
                    row.name,
                    row.student_id,
                    row.average_progress,
                    row.total_goals,
                    row.completed_goals
                );
            }
        }
        Commands::Patterns { from, to } => {
            let window = DateWindow::resolve(from, to, TREND_WINDOW_DAYS, today)?;
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let patterns = progress_analytics::compute_behavior_patterns(
                &snapshot.behavior_events,
                window.from_date(),
                window.to_date(),
            )?;
            print_json(&patterns)?;
        }
        Commands::Trends { student, from, to } => {
            let window = DateWindow::resolve(from, to, TREND_WINDOW_DAYS, today)?;
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let events = snapshot.fetch_behavior_events(&EventFilter {
                student_id: student,
                window: Some(window),
            })?;
            let weeks = progress_analytics::compute_weekly_trends(
                &events,
                window.from_date(),
                window.to_date(),
            )?;

            if weeks.is_empty() {
                println!("No incidents found for this window.");
                return Ok(());
            }

            println!("Incidents per week ({} to {}):", window.from_date(), window.to_date());
            for (week, bucket) in &weeks {
                println!("- Week of {week}: {} incidents", bucket.total);
            }
        }
        Commands::Report {
            student,
            from,
            to,
            format,
            out,
        } => {
            let window = DateWindow::resolve(from, to, DASHBOARD_WINDOW_DAYS, today)?;
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let student_report = report::compose_student_report(
                &snapshot,
                student,
                window.from_date(),
                window.to_date(),
            )?;
            let output = match format {
                Format::Markdown => report::render_student_report(&student_report),
                Format::Json => serde_json::to_string_pretty(&student_report)? + "\n",
            };
            emit(output, out)?;
        }
        Commands::OrgReport {
            from,
            to,
            format,
            out,
        } => {
            let window = DateWindow::resolve(from, to, TREND_WINDOW_DAYS, today)?;
            let snapshot = db::fetch_snapshot(&pool, cli.organization).await?;
            let org_report = report::compose_organization_report(
                &snapshot,
                window.from_date(),
                window.to_date(),
            )?;
            let label = cli.organization.map(|id| format!("organization {id}"));
            let output = match format {
                Format::Markdown => {
                    report::render_organization_report(&org_report, label.as_deref())
                }
                Format::Json => serde_json::to_string_pretty(&org_report)? + "\n",
            };
            emit(output, out)?;
        }
    }

    Ok(())
}
