//! Clear binary for resetting the taskpad database.
//!
//! Usage: cargo run --bin clear
//!
//! Deletes all tasks.

mod config;
mod db;
mod store;
mod task;

use anyhow::Result;
use clap::Parser;

use crate::config::{Args, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Args::parse());
    config::install_tracing();

    tracing::info!(database_url = %config.database_url, "connecting to database");

    // Initialize database connection
    let pool = db::init_db(&config.database_url).await?;

    let result = sqlx::query("DELETE FROM tasks").execute(&pool).await?;
    tracing::info!(rows = result.rows_affected(), "tasks table cleared");

    Ok(())
}
