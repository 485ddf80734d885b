//! Edit-session state for creating or editing a single task.
//!
//! The session keeps each display-form field on the task (`date`, `time`)
//! in sync with a machine-form shadow (`date_input`, `time_input`) that
//! drives the native pickers. All mutation goes through
//! [`EditSession::reduce`].

use tracing::debug;

use crate::datetime::{
    machine_date, machine_time, parse_machine_date, parse_machine_time, to_display_date,
    to_display_time, to_machine_date, to_machine_time,
};
use crate::store::TaskStore;
use crate::task::{Priority, Task, TaskDraft};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditPhase {
    #[default]
    Create,
    Edit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Priority,
    Completed,
    DateInput,
    TimeInput,
}

impl Field {
    /// Name of the matching form control.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Priority => "priority",
            Field::Completed => "completed",
            Field::DateInput => "date_input",
            Field::TimeInput => "time_input",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckboxField {
    Completed,
}

/// One user edit to the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldChange {
    Text { field: TextField, value: String },
    Priority(Priority),
    Checkbox { field: CheckboxField, checked: bool },
    /// Machine-form value from the native date input, empty when cleared.
    DateInput(String),
    /// Machine-form value from the native time input, empty when cleared.
    TimeInput(String),
}

impl FieldChange {
    pub fn field(&self) -> Field {
        match self {
            FieldChange::Text {
                field: TextField::Title,
                ..
            } => Field::Title,
            FieldChange::Text {
                field: TextField::Description,
                ..
            } => Field::Description,
            FieldChange::Priority(_) => Field::Priority,
            FieldChange::Checkbox {
                field: CheckboxField::Completed,
                ..
            } => Field::Completed,
            FieldChange::DateInput(_) => Field::DateInput,
            FieldChange::TimeInput(_) => Field::TimeInput,
        }
    }
}

/// Holds validation errors for the task form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub title: Option<String>,
}

impl FormErrors {
    pub fn has_errors(&self) -> bool {
        self.title.is_some()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            _ => None,
        }
    }

    pub fn clear(&mut self, field: Field) {
        if field == Field::Title {
            self.title = None;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditSession {
    phase: EditPhase,
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub priority: Priority,
    pub completed: bool,
    pub date_set: bool,
    pub date_input: String,
    pub time_input: String,
}

impl EditSession {
    /// Seed a session from an existing task, or from defaults when `task` is
    /// `None`. A task without an id opens in the create phase.
    ///
    /// A stored date or time that does not parse leaves its shadow empty and
    /// the stored display string as it was.
    pub fn open(task: Option<&Task>) -> Self {
        let task = task.cloned().unwrap_or_default();
        let phase = if task.is_new() {
            EditPhase::Create
        } else {
            EditPhase::Edit
        };

        Self {
            phase,
            date_input: to_machine_date(&task.date),
            time_input: to_machine_time(&task.time),
            id: task.id,
            title: task.title,
            description: task.description,
            date: task.date,
            time: task.time,
            priority: task.priority,
            completed: task.completed,
            date_set: task.date_set,
        }
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn is_new(&self) -> bool {
        self.phase == EditPhase::Create
    }

    #[must_use]
    pub fn reduce(mut self, change: FieldChange) -> Self {
        match change {
            FieldChange::Text {
                field: TextField::Title,
                value,
            } => self.title = value,
            FieldChange::Text {
                field: TextField::Description,
                value,
            } => self.description = value,
            FieldChange::Priority(priority) => self.priority = priority,
            FieldChange::Checkbox {
                field: CheckboxField::Completed,
                checked,
            } => self.completed = checked,
            FieldChange::DateInput(value) => {
                // An input that is not a real date counts as cleared.
                self.date_input = parse_machine_date(&value)
                    .map(machine_date)
                    .unwrap_or_default();
                self.date = to_display_date(&self.date_input);
                self.date_set = !self.date_input.is_empty();
            }
            FieldChange::TimeInput(value) => {
                self.time_input = parse_machine_time(&value)
                    .map(machine_time)
                    .unwrap_or_default();
                self.time = to_display_time(&self.time_input);
            }
        }
        self
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some("Title is required".to_string());
        }
        errors
    }

    /// The record to hand to the store. Shadow fields are not part of it;
    /// `date` and `time` are rebuilt from them, so a stored value the
    /// pickers could not show goes out empty.
    pub fn to_submission(&self) -> Submission {
        let draft = TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            date: to_display_date(&self.date_input),
            time: to_display_time(&self.time_input),
            priority: self.priority,
            completed: self.completed,
            date_set: self.date_set,
        };

        match self.phase {
            EditPhase::Create => Submission::Create(draft),
            EditPhase::Edit => Submission::Update {
                id: self.id.clone(),
                changes: draft,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Create(TaskDraft),
    Update { id: String, changes: TaskDraft },
}

impl Submission {
    pub async fn send_to<S: TaskStore>(self, store: &S) {
        match self {
            Submission::Create(draft) => store.add_task(draft).await,
            Submission::Update { id, changes } => store.update_task(&id, changes).await,
        }
    }
}

/// An open editor: the session, its inline errors, and the host's close
/// callback, which runs at most once.
pub struct TaskEditor<F: FnOnce()> {
    session: EditSession,
    errors: FormErrors,
    on_close: Option<F>,
}

impl<F: FnOnce()> TaskEditor<F> {
    pub fn open(task: Option<&Task>, on_close: F) -> Self {
        Self {
            session: EditSession::open(task),
            errors: FormErrors::default(),
            on_close: Some(on_close),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_closed(&self) -> bool {
        self.on_close.is_none()
    }

    pub fn change(&mut self, change: FieldChange) {
        self.errors.clear(change.field());
        self.session = std::mem::take(&mut self.session).reduce(change);
    }

    /// Validate, hand the record to the store and close. Returns `false`
    /// without touching the store when validation fails or the editor is
    /// already closed.
    pub async fn submit<S: TaskStore>(&mut self, store: &S) -> bool {
        if self.is_closed() {
            debug!("submit on a closed editor ignored");
            return false;
        }

        let errors = self.session.validate();
        if errors.has_errors() {
            debug!(id = %self.session.id, "task submission rejected by validation");
            self.errors = errors;
            return false;
        }

        let submission = self.session.to_submission();
        debug!(phase = ?self.session.phase(), id = %self.session.id, "submitting task");
        submission.send_to(store).await;
        self.close();
        true
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    pub fn into_parts(self) -> (EditSession, FormErrors) {
        (self.session, self.errors)
    }

    fn close(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Add(TaskDraft),
        Update(String, TaskDraft),
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingStore {
        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl TaskStore for RecordingStore {
        async fn add_task(&self, draft: TaskDraft) {
            self.calls.lock().unwrap().push(Call::Add(draft));
        }

        async fn update_task(&self, id: &str, changes: TaskDraft) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(id.to_string(), changes));
        }
    }

    fn title(value: &str) -> FieldChange {
        FieldChange::Text {
            field: TextField::Title,
            value: value.to_string(),
        }
    }

    fn existing_task() -> Task {
        Task {
            id: "42".to_string(),
            title: "Water plants".to_string(),
            description: "The fern too".to_string(),
            date: "June 1, 2025".to_string(),
            time: "2:30 pm".to_string(),
            priority: Priority::High,
            completed: false,
            date_set: true,
        }
    }

    #[test]
    fn test_open_new_task_uses_defaults() {
        let session = EditSession::open(None);
        assert_eq!(session.phase(), EditPhase::Create);
        assert!(session.id.is_empty());
        assert_eq!(session.priority, Priority::Normal);
        assert!(!session.completed);
        assert!(!session.date_set);
        assert!(session.date_input.is_empty());
        assert!(session.time_input.is_empty());
    }

    #[test]
    fn test_open_existing_task_derives_shadows() {
        let session = EditSession::open(Some(&existing_task()));
        assert_eq!(session.phase(), EditPhase::Edit);
        assert_eq!(session.date_input, "2025-06-01");
        assert_eq!(session.time_input, "14:30");
        assert_eq!(session.date, "June 1, 2025");
    }

    #[test]
    fn test_open_with_unparseable_date_leaves_shadow_empty() {
        let task = Task {
            date: "garbage".to_string(),
            time: "teatime".to_string(),
            ..existing_task()
        };
        let session = EditSession::open(Some(&task));
        assert!(session.date_input.is_empty());
        assert!(session.time_input.is_empty());
        assert_eq!(session.date, "garbage");
        assert_eq!(session.time, "teatime");
    }

    #[test]
    fn test_task_without_id_opens_in_create_phase() {
        let task = Task {
            id: String::new(),
            ..existing_task()
        };
        let session = EditSession::open(Some(&task));
        assert_eq!(session.phase(), EditPhase::Create);
        assert_eq!(session.title, "Water plants");
    }

    #[test]
    fn test_date_input_keeps_display_date_in_sync() {
        let session = EditSession::open(None).reduce(FieldChange::DateInput("2025-12-31".into()));
        assert_eq!(session.date_input, "2025-12-31");
        assert_eq!(session.date, "December 31, 2025");
        assert!(session.date_set);

        let session = session.reduce(FieldChange::DateInput(String::new()));
        assert_eq!(session.date_input, "");
        assert_eq!(session.date, "");
        assert!(!session.date_set);
    }

    #[test]
    fn test_invalid_date_input_counts_as_cleared() {
        let session = EditSession::open(Some(&existing_task()))
            .reduce(FieldChange::DateInput("2025-02-30".into()));
        assert_eq!(session.date_input, "");
        assert_eq!(session.date, "");
        assert!(!session.date_set);
    }

    #[test]
    fn test_time_input_keeps_display_time_in_sync() {
        let session =
            EditSession::open(Some(&existing_task())).reduce(FieldChange::TimeInput("00:00".into()));
        assert_eq!(session.time, "12:00 am");
        assert!(session.date_set);

        let session = session.reduce(FieldChange::TimeInput("23:59:00".into()));
        assert_eq!(session.time_input, "23:59");
        assert_eq!(session.time, "11:59 pm");

        let session = session.reduce(FieldChange::TimeInput(String::new()));
        assert_eq!(session.time, "");
        assert!(session.date_set);
    }

    #[test]
    fn test_other_fields_pass_through() {
        let before = EditSession::open(Some(&existing_task()));
        let after = before
            .clone()
            .reduce(FieldChange::Text {
                field: TextField::Description,
                value: "All of them".into(),
            })
            .reduce(FieldChange::Checkbox {
                field: CheckboxField::Completed,
                checked: true,
            })
            .reduce(FieldChange::Priority(Priority::Low));

        assert_eq!(after.description, "All of them");
        assert!(after.completed);
        assert_eq!(after.priority, Priority::Low);
        assert_eq!(after.title, before.title);
        assert_eq!(after.date, before.date);
        assert_eq!(after.date_input, before.date_input);
        assert_eq!(after.time, before.time);
        assert_eq!(after.date_set, before.date_set);
    }

    #[test]
    fn test_validation_requires_trimmed_title() {
        let session = EditSession::open(None).reduce(title("   "));
        let errors = session.validate();
        assert!(errors.has_errors());
        assert_eq!(errors.get(Field::Title), Some("Title is required"));

        let session = session.reduce(title(" Buy milk "));
        assert!(!session.validate().has_errors());
    }

    #[tokio::test]
    async fn test_blank_title_blocks_submission() {
        let store = RecordingStore::default();
        let closes = Cell::new(0);
        let mut editor = TaskEditor::open(None, || closes.set(closes.get() + 1));

        assert!(!editor.submit(&store).await);
        assert!(editor.errors().has_errors());
        assert!(store.take().is_empty());
        assert!(!editor.is_closed());
        drop(editor);
        assert_eq!(closes.get(), 0);
    }

    #[tokio::test]
    async fn test_editing_a_field_clears_its_error() {
        let store = RecordingStore::default();
        let mut editor = TaskEditor::open(None, || {});
        editor.submit(&store).await;
        assert!(editor.errors().get(Field::Title).is_some());

        editor.change(FieldChange::DateInput("2025-06-01".into()));
        assert!(editor.errors().get(Field::Title).is_some());

        editor.change(title("B"));
        assert!(!editor.errors().has_errors());
    }

    #[tokio::test]
    async fn test_new_task_submission_adds_display_form_record() {
        let store = RecordingStore::default();
        let closes = Cell::new(0);
        let mut editor = TaskEditor::open(None, || closes.set(closes.get() + 1));

        editor.change(title("Buy milk"));
        editor.change(FieldChange::DateInput("2025-06-01".into()));
        editor.change(FieldChange::TimeInput("14:30".into()));
        assert!(editor.submit(&store).await);
        assert!(editor.is_closed());

        let calls = store.take();
        let [Call::Add(draft)] = calls.as_slice() else {
            panic!("expected a single add, got {:?}", calls);
        };
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.date, "June 1, 2025");
        assert_eq!(draft.time, "2:30 pm");
        assert!(draft.date_set);

        let json = serde_json::to_value(draft).unwrap();
        let keys = json.as_object().unwrap();
        assert!(!keys.contains_key("dateInput"));
        assert!(!keys.contains_key("timeInput"));
        assert!(!keys.contains_key("id"));

        drop(editor);
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_existing_task_submission_updates_by_id() {
        let store = RecordingStore::default();
        let mut editor = TaskEditor::open(Some(&existing_task()), || {});
        editor.change(FieldChange::Checkbox {
            field: CheckboxField::Completed,
            checked: true,
        });
        assert!(editor.submit(&store).await);

        let calls = store.take();
        let [Call::Update(id, changes)] = calls.as_slice() else {
            panic!("expected a single update, got {:?}", calls);
        };
        assert_eq!(id, "42");
        assert!(changes.completed);
        assert_eq!(changes.date, "June 1, 2025");
        assert_eq!(changes.time, "2:30 pm");
        assert_eq!(changes.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_unparseable_stored_values_submit_as_empty() {
        let store = RecordingStore::default();
        let task = Task {
            date: "garbage".to_string(),
            time: "teatime".to_string(),
            ..existing_task()
        };
        let mut editor = TaskEditor::open(Some(&task), || {});
        assert_eq!(editor.session().date, "garbage");
        assert!(editor.submit(&store).await);

        let calls = store.take();
        let [Call::Update(id, changes)] = calls.as_slice() else {
            panic!("expected a single update, got {:?}", calls);
        };
        assert_eq!(id, "42");
        assert_eq!(changes.date, "");
        assert_eq!(changes.time, "");
        assert_eq!(changes.title, "Water plants");
    }

    #[test]
    fn test_submission_date_follows_shadow() {
        let task = Task {
            date: "garbage".to_string(),
            ..existing_task()
        };
        let Submission::Update { changes, .. } = EditSession::open(Some(&task)).to_submission()
        else {
            panic!("expected an update");
        };
        assert_eq!(changes.date, "");
        assert_eq!(changes.time, "2:30 pm");

        let session =
            EditSession::open(Some(&task)).reduce(FieldChange::DateInput("2025-07-04".into()));
        let Submission::Update { changes, .. } = session.to_submission() else {
            panic!("expected an update");
        };
        assert_eq!(changes.date, "July 4, 2025");
        assert!(changes.date_set);
    }

    #[tokio::test]
    async fn test_close_callback_runs_once() {
        let store = RecordingStore::default();
        let closes = Cell::new(0);
        let mut editor = TaskEditor::open(Some(&existing_task()), || closes.set(closes.get() + 1));

        editor.cancel();
        editor.cancel();
        assert!(!editor.submit(&store).await);
        assert!(store.take().is_empty());
        drop(editor);
        assert_eq!(closes.get(), 1);
    }
}
