//! Seed binary for populating the taskpad database with initial tasks.
//!
//! Usage: cargo run --bin seed
//!        cargo run --bin seed -- --file other_seed.toml
//!
//! Reads from seed.toml in the project root and inserts tasks into the database.
//! Dates and times in the file use the `YYYY-MM-DD` / `HH:MM` form.

mod config;
mod datetime;
mod db;
mod store;
mod task;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;

use crate::config::Config;
use crate::datetime::{to_display_date, to_display_time};
use crate::task::{Priority, TaskDraft};

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Insert the tasks listed in a seed file")]
struct SeedArgs {
    /// Database URL (overrides DATABASE_URL from .env)
    #[arg(long)]
    db: Option<String>,

    /// Seed file to read
    #[arg(long, default_value = "seed.toml")]
    file: String,
}

#[derive(Debug, Deserialize)]
struct SeedData {
    #[serde(default)]
    tasks: Vec<SeedTask>,
}

#[derive(Debug, Deserialize)]
struct SeedTask {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    completed: bool,
}

impl SeedTask {
    fn to_draft(&self) -> TaskDraft {
        let date = self.date.as_deref().map(to_display_date).unwrap_or_default();
        let time = self.time.as_deref().map(to_display_time).unwrap_or_default();

        if self.date.is_some() && date.is_empty() {
            tracing::warn!(title = %self.title, "seed date not in YYYY-MM-DD form, left unset");
        }
        if self.time.is_some() && time.is_empty() {
            tracing::warn!(title = %self.title, "seed time not in HH:MM form, left unset");
        }

        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            date_set: !date.is_empty(),
            date,
            time,
            priority: self.priority,
            completed: self.completed,
        }
    }
}

fn parse_seed(content: &str) -> Result<Vec<TaskDraft>> {
    let seed_data: SeedData = toml::from_str(content)?;
    Ok(seed_data.tasks.iter().map(SeedTask::to_draft).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();
    let config = Config::load(config::Args {
        db: args.db,
        ..config::Args::default()
    });
    config::install_tracing();

    // Connect to database
    let pool = db::init_db(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "connected to database");

    // Read seed file
    let seed_content = fs::read_to_string(&args.file)
        .with_context(|| format!("reading seed file {}", args.file))?;
    let drafts = parse_seed(&seed_content)?;

    tracing::info!(count = drafts.len(), "seeding tasks");

    // Insert each task
    for draft in &drafts {
        match db::insert_task(&pool, draft).await {
            Ok(id) => tracing::info!(id, title = %draft.title, "created task"),
            Err(e) => tracing::error!(error = %e, title = %draft.title, "failed to create task"),
        }
    }

    tracing::info!("seeding complete");

    Ok(())
}
