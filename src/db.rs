use anyhow::Result;
use sqlx::{FromRow, sqlite::SqlitePool};

use crate::store::TaskStore;
use crate::task::{Task, TaskDraft};

pub type DbPool = SqlitePool;

pub async fn init_db(database_url: &str) -> Result<DbPool> {
    let pool = SqlitePool::connect(database_url).await?;
    create_tables(&pool).await?;
    Ok(pool)
}

pub async fn create_tables(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            -- Display form, e.g. "June 1, 2025" / "2:30 pm"; empty when unset
            date TEXT NOT NULL DEFAULT '',
            time TEXT NOT NULL DEFAULT '',
            priority TEXT NOT NULL DEFAULT 'normal',
            completed INTEGER NOT NULL DEFAULT 0,
            date_set INTEGER NOT NULL DEFAULT 0,
            created_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, FromRow)]
pub struct DbTask {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub priority: String,
    pub completed: i64,
    pub date_set: i64,
    pub created_at: Option<String>,
}

impl DbTask {
    pub fn into_task(self) -> Task {
        Task {
            id: self.id.to_string(),
            title: self.title,
            description: self.description.unwrap_or_default(),
            date: self.date,
            time: self.time,
            priority: self.priority.parse().unwrap_or_default(),
            completed: self.completed != 0,
            date_set: self.date_set != 0,
        }
    }
}

// Insert a new task, returning its id
pub async fn insert_task(pool: &DbPool, draft: &TaskDraft) -> Result<i64> {
    let created_at = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO tasks (title, description, date, time, priority, completed, date_set, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.date)
    .bind(&draft.time)
    .bind(draft.priority.as_str())
    .bind(draft.completed as i64)
    .bind(draft.date_set as i64)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

// Overwrite every editable column of an existing task.
// Returns false if no row has that id.
pub async fn update_task_row(pool: &DbPool, task_id: i64, changes: &TaskDraft) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, date = ?, time = ?, priority = ?, completed = ?, date_set = ? WHERE id = ?",
    )
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(&changes.date)
    .bind(&changes.time)
    .bind(changes.priority.as_str())
    .bind(changes.completed as i64)
    .bind(changes.date_set as i64)
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Get a task by ID from the database
pub async fn get_task(pool: &DbPool, task_id: i64) -> Result<Option<Task>> {
    let task: Option<DbTask> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

    Ok(task.map(DbTask::into_task))
}

// Get all tasks, open ones first, then in creation order
pub async fn get_all_tasks(pool: &DbPool) -> Result<Vec<Task>> {
    let tasks: Vec<DbTask> = sqlx::query_as("SELECT * FROM tasks ORDER BY completed, id")
        .fetch_all(pool)
        .await?;

    Ok(tasks.into_iter().map(DbTask::into_task).collect())
}

pub async fn get_task_count(pool: &DbPool) -> Result<i64> {
    let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await?;
    Ok(result.0)
}

/// SQLite-backed [`TaskStore`]. Write failures are logged, not returned.
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: DbPool,
}

impl SqliteTaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TaskStore for SqliteTaskStore {
    async fn add_task(&self, draft: TaskDraft) {
        match insert_task(&self.pool, &draft).await {
            Ok(id) => tracing::info!(id, title = %draft.title, "task created"),
            Err(e) => tracing::error!(error = %e, title = %draft.title, "failed to create task"),
        }
    }

    async fn update_task(&self, id: &str, changes: TaskDraft) {
        let Ok(task_id) = id.parse::<i64>() else {
            tracing::warn!(id, "update for non-numeric task id ignored");
            return;
        };

        match update_task_row(&self.pool, task_id, &changes).await {
            Ok(true) => tracing::info!(id = task_id, "task updated"),
            Ok(false) => tracing::warn!(id = task_id, "update for unknown task ignored"),
            Err(e) => tracing::error!(error = %e, id = task_id, "failed to update task"),
        }
    }
}
