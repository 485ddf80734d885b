use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Normal, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority: '{}'", other)),
        }
    }
}

/// A task as held by the task store. `date` and `time` are display form
/// (`June 1, 2025`, `2:30 pm`) or empty when unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Empty until the store has created the task.
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub priority: Priority,
    pub completed: bool,
    pub date_set: bool,
}

/// Everything about a task except its id: the record handed to the store
/// on create, and the set of changes on update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub priority: Priority,
    pub completed: bool,
    pub date_set: bool,
}

impl Task {
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    pub fn into_parts(self) -> (String, TaskDraft) {
        let Task {
            id,
            title,
            description,
            date,
            time,
            priority,
            completed,
            date_set,
        } = self;
        (
            id,
            TaskDraft {
                title,
                description,
                date,
                time,
                priority,
                completed,
                date_set,
            },
        )
    }

    /// "June 1, 2025 at 2:30 pm", "June 1, 2025", "at 2:30 pm" or "".
    pub fn when_as_readable_string(&self) -> String {
        match (self.date.is_empty(), self.time.is_empty()) {
            (false, false) => format!("{} at {}", self.date, self.time),
            (false, true) => self.date.clone(),
            (true, false) => format!("at {}", self.time),
            (true, true) => String::new(),
        }
    }
}

impl TaskDraft {
    pub fn into_task(self, id: impl Into<String>) -> Task {
        Task {
            id: id.into(),
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            priority: self.priority,
            completed: self.completed,
            date_set: self.date_set,
        }
    }
}
