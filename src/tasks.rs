use axum::{
    Form, Router,
    extract::{Path, State},
    response::Html,
    routing::{get, post},
};
use hypertext::{Raw, prelude::*};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::datetime::{Clock, SystemClock, today_machine_date};
use crate::db::{self, DbPool, SqliteTaskStore};
use crate::editor::{
    CheckboxField, EditSession, Field, FieldChange, FormErrors, TaskEditor, TextField,
};
use crate::picker::{self, PickerForm, PickerState};
use crate::store::{MemoryTaskStore, TaskStore};
use crate::task::{Priority, Task, TaskDraft};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/list", get(tasks_list))
        .route("/new", get(new_task_modal).post(create_task))
        .route("/quick-add", post(quick_add))
        .route("/quick-add/picker", post(quick_add_picker))
        .route("/{id}/edit-modal", get(task_edit_modal))
        .route("/{id}", post(save_task))
        .route("/{id}/complete", post(toggle_complete))
}

// Returned after a successful save: empties the modal container and reloads the list
const CLOSE_MODAL_RESPONSE: &str = r##"<div hx-get="/tasks/list" hx-trigger="load" hx-target="#task-list" hx-swap="innerHTML"></div>"##;

// ============================================================================
// Demo data
// ============================================================================

pub fn demo_drafts() -> Vec<TaskDraft> {
    vec![
        TaskDraft {
            title: "Water Plants".to_string(),
            description: "Water all indoor plants, including the fern in the living room."
                .to_string(),
            date: "June 1, 2025".to_string(),
            time: "9:00 am".to_string(),
            date_set: true,
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Pay Rent".to_string(),
            description: "Transfer rent payment to landlord.".to_string(),
            date: "July 1, 2025".to_string(),
            priority: Priority::High,
            date_set: true,
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Take Out Trash".to_string(),
            time: "7:00 pm".to_string(),
            completed: true,
            ..TaskDraft::default()
        },
        TaskDraft {
            title: "Imported From Old App".to_string(),
            description: "Stored date is not in a format the editor understands.".to_string(),
            date: "next tuesday-ish".to_string(),
            time: "noon".to_string(),
            priority: Priority::Low,
            date_set: true,
            ..TaskDraft::default()
        },
    ]
}

pub fn demo_store() -> MemoryTaskStore {
    MemoryTaskStore::with_tasks(demo_drafts())
}

// ============================================================================
// Form handling
// ============================================================================

// Form data for the task editor
#[derive(Deserialize, Debug, Default)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_input: String,
    #[serde(default)]
    pub time_input: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub completed: Option<String>,
}

impl TaskForm {
    /// The posted form as a sequence of edits against `session`.
    /// Date and time are only emitted when they differ from what the
    /// session already shows, so an untouched picker is not replayed as an
    /// edit.
    pub fn changes(&self, session: &EditSession) -> Vec<FieldChange> {
        let mut changes = vec![
            FieldChange::Text {
                field: TextField::Title,
                value: self.title.clone(),
            },
            FieldChange::Text {
                field: TextField::Description,
                value: self.description.clone(),
            },
            FieldChange::Checkbox {
                field: CheckboxField::Completed,
                checked: self.completed.is_some(),
            },
        ];

        if let Some(priority) = self.priority.as_deref().and_then(|p| p.parse().ok()) {
            changes.push(FieldChange::Priority(priority));
        }
        if self.date_input != session.date_input {
            changes.push(FieldChange::DateInput(self.date_input.clone()));
        }
        if self.time_input != session.time_input {
            changes.push(FieldChange::TimeInput(self.time_input.clone()));
        }

        changes
    }
}

/// Replay the form into an editor for `task` and submit it. On success the
/// response closes the modal; otherwise the modal comes back with errors.
async fn save_from_form<S: TaskStore>(
    store: &S,
    task: Option<&Task>,
    form: &TaskForm,
    clock: &impl Clock,
) -> Html<String> {
    let closed = AtomicBool::new(false);
    let mut editor = TaskEditor::open(task, || closed.store(true, Ordering::Relaxed));

    for change in form.changes(editor.session()) {
        editor.change(change);
    }
    editor.submit(store).await;

    let (session, errors) = editor.into_parts();
    if closed.load(Ordering::Relaxed) {
        return Html(CLOSE_MODAL_RESPONSE.to_string());
    }

    Html(render_task_modal(&session, &errors, clock))
}

// Quick-add form data: a title plus the date/time picker fields
#[derive(Deserialize, Debug)]
pub struct QuickAddForm {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub picker: PickerForm,
}

/// The task a quick-add would create: overrides where enabled, else now.
pub fn quick_add_task(title: &str, state: &PickerState, clock: &impl Clock) -> Task {
    let stamp = picker::resolve(state, clock);
    Task {
        title: title.to_string(),
        date: stamp.date,
        time: stamp.time,
        date_set: state.date.enabled,
        ..Task::default()
    }
}

// ============================================================================
// Handlers
// ============================================================================

// GET / - Homepage with the task list and quick-add form
pub async fn homepage(State(pool): State<DbPool>) -> Html<String> {
    let list_html = render_task_list(&pool).await;
    let quick_add_html = render_quick_add(&PickerState::default(), "", None, &SystemClock);

    let body = maud! {
        div .homepage id="homepage" {
            h1 { "Tasks" }

            div .list-controls {
                (Raw::dangerously_create(
                    r##"<button class="btn" hx-get="/tasks/new" hx-target="#modal-container" hx-swap="innerHTML">New Task</button>"##
                ))
            }

            section .task-section {
                (Raw::dangerously_create(&quick_add_html))
            }

            section .task-section {
                div #task-list {
                    (Raw::dangerously_create(&list_html))
                }
            }

            // Modal container (initially empty)
            div #modal-container {}
        }
    }
    .render()
    .into_inner();

    Html(render_page("Tasks", &body))
}

// GET /tasks/list - Return just the task list (for HTMX)
async fn tasks_list(State(pool): State<DbPool>) -> Html<String> {
    Html(render_task_list(&pool).await)
}

// GET /tasks/new - Show modal for creating a new task
async fn new_task_modal() -> Html<String> {
    let session = EditSession::open(None);
    Html(render_task_modal(&session, &FormErrors::default(), &SystemClock))
}

// POST /tasks/new - Create a new task
async fn create_task(State(pool): State<DbPool>, Form(form): Form<TaskForm>) -> Html<String> {
    let store = SqliteTaskStore::new(pool);
    save_from_form(&store, None, &form, &SystemClock).await
}

// GET /tasks/:id/edit-modal - Get edit view as a modal
async fn task_edit_modal(State(pool): State<DbPool>, Path(id): Path<String>) -> Html<String> {
    match load_task(&pool, &id).await {
        Some(task) => {
            let session = EditSession::open(Some(&task));
            Html(render_task_modal(&session, &FormErrors::default(), &SystemClock))
        }
        None => not_found(&id),
    }
}

// POST /tasks/:id - Save the task
async fn save_task(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Html<String> {
    let Some(task) = load_task(&pool, &id).await else {
        return not_found(&id);
    };
    let store = SqliteTaskStore::new(pool);
    save_from_form(&store, Some(&task), &form, &SystemClock).await
}

// POST /tasks/:id/complete - Flip a task's completed flag
async fn toggle_complete(State(pool): State<DbPool>, Path(id): Path<String>) -> Html<String> {
    if let Some(task) = load_task(&pool, &id).await {
        let store = SqliteTaskStore::new(pool.clone());
        let mut editor = TaskEditor::open(Some(&task), || {});
        editor.change(FieldChange::Checkbox {
            field: CheckboxField::Completed,
            checked: !task.completed,
        });
        if !editor.submit(&store).await {
            tracing::warn!(%id, "completion toggle rejected");
        }
    }

    // Re-render the list
    Html(render_task_list(&pool).await)
}

// POST /tasks/quick-add - Create a task from the quick-add form
async fn quick_add(State(pool): State<DbPool>, Form(form): Form<QuickAddForm>) -> Html<String> {
    let clock = SystemClock;
    let state = form.picker.into_state(&clock);
    let task = quick_add_task(&form.title, &state, &clock);

    let store = SqliteTaskStore::new(pool);
    let mut editor = TaskEditor::open(Some(&task), || {});
    if editor.submit(&store).await {
        let fresh = render_quick_add(&PickerState::default(), "", None, &clock);
        return Html(format!("{}{}", fresh, CLOSE_MODAL_RESPONSE));
    }

    Html(render_quick_add(
        &state,
        &form.title,
        editor.errors().get(Field::Title),
        &clock,
    ))
}

// POST /tasks/quick-add/picker - Re-render the picker after a toggle (doesn't save)
async fn quick_add_picker(Form(form): Form<QuickAddForm>) -> Html<String> {
    let clock = SystemClock;
    let state = form.picker.into_state(&clock);
    Html(picker::render_date_time_picker(&state, &clock))
}

async fn load_task(pool: &DbPool, id: &str) -> Option<Task> {
    let task_id = id.parse::<i64>().ok()?;
    match db::get_task(pool, task_id).await {
        Ok(task) => task,
        Err(e) => {
            tracing::error!(error = %e, %id, "failed to load task");
            None
        }
    }
}

fn not_found(id: &str) -> Html<String> {
    let message = format!("Task '{}' not found", id);
    Html(
        maud! {
            div .modal-overlay {
                div .window {
                    div .window-pane { (message) }
                }
            }
        }
        .render()
        .into_inner(),
    )
}

// ============================================================================
// Rendering Functions
// ============================================================================

pub fn render_page(title: &str, body: &str) -> String {
    maud! {
        !DOCTYPE
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Taskpad" }
                link rel="stylesheet" href="/static/system.css";
                link rel="stylesheet" href="/static/app.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body {
                (Raw::dangerously_create(body))
            }
        }
    }
    .render()
    .into_inner()
}

async fn render_task_list(pool: &DbPool) -> String {
    let tasks = db::get_all_tasks(pool).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to list tasks");
        Vec::new()
    });
    render_task_items(&tasks)
}

pub fn render_task_items(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return maud! {
            div .empty-list {
                p { "No tasks yet. Create your first task!" }
            }
        }
        .render()
        .into_inner();
    }

    let items: Vec<String> = tasks.iter().map(render_task_list_item).collect();

    maud! {
        ul .task-list {
            (Raw::dangerously_create(&items.join("\n")))
        }
    }
    .render()
    .into_inner()
}

fn render_task_list_item(task: &Task) -> String {
    let item_class = if task.completed {
        "task-list-item task-list-item-completed"
    } else {
        "task-list-item"
    };
    let when = task.when_as_readable_string();

    let edit_button = format!(
        r##"<button class="btn" hx-get="/tasks/{}/edit-modal" hx-target="#modal-container" hx-swap="innerHTML">Edit</button>"##,
        task.id
    );
    let complete_button = format!(
        r##"<button class="btn task-complete-btn" hx-post="/tasks/{}/complete" hx-target="#task-list" hx-swap="innerHTML">{}</button>"##,
        task.id,
        if task.completed { "Undo" } else { "Done" }
    );

    maud! {
        li class=(item_class) {
            (Raw::dangerously_create(&edit_button))
            span .task-title { (task.title) }
            @if task.completed {
                span .task-done-label { "✓" }
            }
            @if !when.is_empty() {
                span .task-when { (when) }
            }
            span .task-priority { (task.priority.label()) }
            @if !task.description.is_empty() {
                div .task-description { (task.description) }
            }
            (Raw::dangerously_create(&complete_button))
        }
    }
    .render()
    .into_inner()
}

fn render_task_modal(session: &EditSession, errors: &FormErrors, clock: &impl Clock) -> String {
    let editor_html = render_task_editor(session, errors, clock);

    maud! {
        div .modal-overlay {
            (Raw::dangerously_create(&editor_html))
        }
    }
    .render()
    .into_inner()
}

pub fn render_task_editor(session: &EditSession, errors: &FormErrors, clock: &impl Clock) -> String {
    let is_new = session.is_new();

    // Use "new" as the ID suffix for new tasks
    let id_suffix = if is_new {
        "new".to_string()
    } else {
        session.id.clone()
    };

    let title_id = format!("task-title-{}", id_suffix);
    let description_id = format!("task-description-{}", id_suffix);
    let date_id = format!("task-date-{}", id_suffix);
    let time_id = format!("task-time-{}", id_suffix);
    let priority_id = format!("task-priority-{}", id_suffix);
    let completed_id = format!("task-completed-{}", id_suffix);
    let editor_id = format!("task-editor-{}", id_suffix);
    let min_date = today_machine_date(clock);

    let hx_save_post = if is_new {
        "/tasks/new".to_string()
    } else {
        format!("/tasks/{}", session.id)
    };

    let title_error = errors.get(Field::Title);
    let title_class = if title_error.is_some() { "error" } else { "" };
    let title_error_html = title_error
        .map(|msg| format!(r#"<div class="error-message">{}</div>"#, msg))
        .unwrap_or_default();

    // A stored date the picker can't show; tell the user what it was
    let unshown_date = (session.date_input.is_empty() && !session.date.is_empty())
        .then(|| session.date.clone());
    let unshown_time = (session.time_input.is_empty() && !session.time.is_empty())
        .then(|| session.time.clone());

    let close_button = r##"<button class="close" aria-label="Close editor" onclick="document.getElementById('modal-container').innerHTML = ''"></button>"##;
    let cancel_button = r##"<button class="btn cancel-button" type="button" onclick="document.getElementById('modal-container').innerHTML = ''">Cancel</button>"##;
    let save_button = format!(
        r##"<button class="btn btn-default save-button" type="button" hx-post="{}" hx-target="#modal-container" hx-swap="innerHTML" hx-include="closest form">{}</button>"##,
        hx_save_post,
        if is_new { "Add Task" } else { "Save Changes" }
    );

    let heading = if is_new { "Add New Task" } else { "Edit Task" };

    maud! {
        div .window.task-editor id=(editor_id) {
            div .title-bar {
                (Raw::dangerously_create(close_button))
                h1 .title { (heading) }
            }
            div .separator {}

            div .window-pane {
                form {
                    div .form-group {
                        label for=(title_id) { "Task Title " span .required { "*" } }
                        input
                            type="text"
                            id=(title_id)
                            name="title"
                            class=(title_class)
                            placeholder="Enter task title"
                            value=(session.title);
                        (Raw::dangerously_create(&title_error_html))
                    }

                    div .form-group {
                        label for=(description_id) { "Description" }
                        textarea
                            id=(description_id)
                            name="description"
                            placeholder="Describe your task"
                        { (session.description) }
                    }

                    div .form-row {
                        div .form-group.date-group {
                            label for=(date_id) { "Date" }
                            input
                                type="date"
                                id=(date_id)
                                name="date_input"
                                min=(min_date)
                                value=(session.date_input);
                            @if let Some(stored) = &unshown_date {
                                small .stored-value { "Currently: " (stored) }
                            }
                        }

                        div .form-group.time-group {
                            label for=(time_id) { "Time" }
                            input
                                type="time"
                                id=(time_id)
                                name="time_input"
                                value=(session.time_input);
                            @if let Some(stored) = &unshown_time {
                                small .stored-value { "Currently: " (stored) }
                            }
                        }
                    }

                    div .form-group {
                        label for=(priority_id) { "Priority" }
                        (Raw::dangerously_create(&render_priority_select(&priority_id, session.priority)))
                    }

                    div .form-group.checkbox-group {
                        div .field-row {
                            @if session.completed {
                                input type="checkbox" id=(completed_id) name="completed" checked;
                            } @else {
                                input type="checkbox" id=(completed_id) name="completed";
                            }
                            label for=(completed_id) { "Mark as completed" }
                        }
                    }

                    div .form-actions {
                        (Raw::dangerously_create(cancel_button))
                        " "
                        (Raw::dangerously_create(&save_button))
                    }
                }
            }
        }
    }
    .render()
    .into_inner()
}

fn render_priority_select(id: &str, current: Priority) -> String {
    let options: String = Priority::ALL
        .iter()
        .map(|p| {
            let selected = if *p == current { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, p.as_str(), selected, p.label())
        })
        .collect();

    format!(r#"<select id="{id}" name="priority">{options}</select>"#)
}

pub fn render_quick_add(
    state: &PickerState,
    title: &str,
    title_error: Option<&str>,
    clock: &impl Clock,
) -> String {
    let picker_html = picker::render_date_time_picker(state, clock);
    let title_class = if title_error.is_some() { "error" } else { "" };
    let error_html = title_error
        .map(|msg| format!(r#"<div class="error-message">{}</div>"#, msg))
        .unwrap_or_default();
    let add_button = r##"<button class="btn btn-default" type="button" hx-post="/tasks/quick-add" hx-target="#quick-add" hx-swap="outerHTML" hx-include="closest form">Add</button>"##;

    maud! {
        form .quick-add id="quick-add" {
            div .form-group {
                label for="quick-add-title" { "Quick add" }
                input
                    type="text"
                    id="quick-add-title"
                    name="title"
                    class=(title_class)
                    placeholder="Enter task title"
                    value=(title);
                (Raw::dangerously_create(&error_html))
            }
            (Raw::dangerously_create(&picker_html))
            div .form-actions {
                (Raw::dangerously_create(add_button))
            }
        }
    }
    .render()
    .into_inner()
}
