use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::{FieldError, TaskChanges, TaskDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| FieldError::UnknownPriority(s.to_string()))
    }
}

/// Manual bucket a task sits in. Independent of completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    New,
    Pending,
    Scheduled,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::New, Category::Pending, Category::Scheduled];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::New => "new",
            Category::Pending => "pending",
            Category::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FieldError::UnknownCategory(s.to_string()))
    }
}

/// Observable lifecycle state of a persisted task. Deletion is terminal
/// and leaves nothing behind, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Open,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
}

impl Task {
    pub fn new(owner_id: Uuid, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            completed: false,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
            created_at,
            owner_id,
        }
    }

    /// Replaces the fields present in `changes`. Identity, owner and
    /// creation time are never touched.
    pub fn apply(&mut self, changes: TaskChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
    }

    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Done
        } else {
            TaskState::Open
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.priority == Priority::High && !self.completed
    }
}
