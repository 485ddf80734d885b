//! Backup binary for copying the taskpad database to a backup file.
//!
//! Usage: cargo run --bin backup
//!        cargo run --bin backup -- --target my_backup.db
//!        cargo run --bin backup -- --db sqlite:other.db --target backup.db
//!
//! Creates a backup of all tasks in a new file.

mod config;
mod datetime;
mod db;
mod store;
mod task;

use anyhow::Result;
use chrono::Datelike;
use clap::Parser;

use crate::config::Config;
use crate::datetime::{Clock, SystemClock};
use crate::db::DbPool;

#[derive(Parser, Debug)]
#[command(name = "backup")]
#[command(about = "Backup the taskpad database to a new file")]
struct BackupArgs {
    /// Source database URL (overrides DATABASE_URL from .env)
    #[arg(long)]
    db: Option<String>,

    /// Target backup file path (default: backup_{year}_{month}_{day}.db)
    #[arg(long)]
    target: Option<String>,
}

// Named after the local calendar day
fn default_target(clock: &impl Clock) -> String {
    let today = clock.now().date();
    format!(
        "backup_{}_{:02}_{:02}.db",
        today.year(),
        today.month(),
        today.day()
    )
}

type TaskRow = (
    i64,
    String,
    Option<String>,
    String,
    String,
    String,
    i64,
    i64,
    Option<String>,
);

// Copy every task row, ids included. Returns the number copied.
async fn copy_tasks(source: &DbPool, target: &DbPool) -> Result<usize> {
    let tasks: Vec<TaskRow> = sqlx::query_as(
        "SELECT id, title, description, date, time, priority, completed, date_set, created_at FROM tasks",
    )
    .fetch_all(source)
    .await?;

    for task in &tasks {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, date, time, priority, completed, date_set, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.0)
        .bind(&task.1)
        .bind(&task.2)
        .bind(&task.3)
        .bind(&task.4)
        .bind(&task.5)
        .bind(task.6)
        .bind(task.7)
        .bind(&task.8)
        .execute(target)
        .await?;
    }

    Ok(tasks.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = BackupArgs::parse();
    let config = Config::load(config::Args {
        db: args.db,
        ..config::Args::default()
    });
    config::install_tracing();

    // Generate target filename
    let target_file = args
        .target
        .unwrap_or_else(|| default_target(&SystemClock));
    let target_url = format!("sqlite:{}?mode=rwc", target_file);

    tracing::info!(source = %config.database_url, target = %target_file, "starting backup");

    // Connect to source database
    let source_pool = db::init_db(&config.database_url).await?;

    // Create and connect to target database (init_db creates tables)
    let target_pool = db::init_db(&target_url).await?;

    let copied = copy_tasks(&source_pool, &target_pool).await?;
    tracing::info!(copied, target = %target_file, "backup completed");

    Ok(())
}
