mod config;
mod datetime;
mod db;
mod editor;
mod picker;
mod store;
mod storybook;
mod task;
mod tasks;

use anyhow::Result;
use axum::{Router, routing::get, routing::get_service};
use clap::Parser;
use std::fs;
use tower_http::services::ServeDir;

use crate::config::{Args, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Args::parse());
    config::install_tracing();

    // Initialize database
    let pool = db::init_db(&config.database_url).await?;
    tracing::info!(database_url = %config.database_url, "database initialized");

    fs::create_dir_all(&config.static_dir)?;
    let static_dir = ServeDir::new(&config.static_dir);

    let app = Router::new()
        .route("/", get(tasks::homepage))
        .nest("/storybook", storybook::router())
        .nest("/tasks", tasks::router())
        .with_state(pool)
        .nest_service("/static", get_service(static_dir));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
