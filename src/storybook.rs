use axum::{Router, response::Html, routing::get};
use chrono::NaiveDate;
use hypertext::{Raw, prelude::*};

use crate::datetime::FixedClock;
use crate::db::DbPool;
use crate::editor::{EditSession, FormErrors};
use crate::picker::{self, Override, PickerMsg, PickerState};
use crate::tasks::{demo_store, render_page, render_task_editor};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/tasks/edit", get(tasks_edit_all))
        .route("/picker", get(picker_all))
}

// Pinned so the gallery renders the same every day
fn story_clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .unwrap_or_default(),
    )
}

// GET /storybook/tasks/edit - Show all demo tasks in a grid
async fn tasks_edit_all() -> Html<String> {
    let clock = story_clock();
    let tasks = demo_store().all();

    let mut task_editors: Vec<String> = vec![render_task_editor(
        &EditSession::open(None),
        &FormErrors::default(),
        &clock,
    )];

    for task in &tasks {
        let session = EditSession::open(Some(task));
        task_editors.push(render_task_editor(&session, &FormErrors::default(), &clock));
    }

    // A blank title shows the inline error
    if let Some(task) = tasks.first() {
        let mut session = EditSession::open(Some(task));
        session.title.clear();
        let errors = session.validate();
        task_editors.push(render_task_editor(&session, &errors, &clock));
    }

    let editors_html = task_editors.join("\n");

    let body = maud! {
        h1 { "Task Editor Storybook" }
        p { "Edit forms for new tasks, saved tasks, validation errors and stored dates the picker can't show:" }

        div .task-grid {
            (Raw::dangerously_create(&editors_html))
        }
    }
    .render()
    .into_inner();

    Html(render_page("Task Editor - Storybook", &body))
}

fn picker_stories() -> Vec<(&'static str, PickerState)> {
    let mut date_set = PickerState::default();
    picker::update(&mut date_set, PickerMsg::ToggleDate);
    picker::update(&mut date_set, PickerMsg::DateChanged("2025-06-01".to_string()));

    let mut both_set = date_set.clone();
    picker::update(&mut both_set, PickerMsg::ToggleTime);
    picker::update(&mut both_set, PickerMsg::TimeChanged("14:30".to_string()));

    let remembered = PickerState {
        date: Override {
            enabled: false,
            value: "June 1, 2025".to_string(),
        },
        time: Override::default(),
    };

    vec![
        ("Defaults", PickerState::default()),
        ("Specific date", date_set),
        ("Specific date and time", both_set),
        ("Date turned off, value remembered", remembered),
    ]
}

// GET /storybook/picker - Show the date/time picker in each state
async fn picker_all() -> Html<String> {
    let clock = story_clock();

    let stories: Vec<String> = picker_stories()
        .into_iter()
        .map(|(label, state)| {
            let stamp = picker::resolve(&state, &clock);
            let picker_html = picker::render_date_time_picker(&state, &clock);
            maud! {
                div .window.picker-story {
                    div .title-bar {
                        h1 .title { (label) }
                    }
                    div .window-pane {
                        form {
                            (Raw::dangerously_create(&picker_html))
                        }
                        p .picker-resolved { "Resolves to " (stamp.date) " at " (stamp.time) }
                    }
                }
            }
            .render()
            .into_inner()
        })
        .collect();

    let body = maud! {
        h1 { "Date/Time Picker Storybook" }
        div .task-grid {
            (Raw::dangerously_create(&stories.join("\n")))
        }
    }
    .render()
    .into_inner();

    Html(render_page("Picker - Storybook", &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_editor_gallery_includes_error_story() {
        let Html(html) = tasks_edit_all().await;
        assert!(html.contains("Add New Task"));
        assert!(html.contains("Title is required"));
        assert!(html.contains("Currently: next tuesday-ish"));
    }

    #[tokio::test]
    async fn test_picker_gallery_resolves_each_state() {
        let Html(html) = picker_all().await;
        assert!(html.contains("Resolves to May 20, 2025 at 9:05 am"));
        assert!(html.contains("Resolves to June 1, 2025 at 2:30 pm"));
        // Disabled override falls back to today
        assert_eq!(html.matches("Resolves to May 20, 2025").count(), 2);
    }
}
