use super::enums::{Priority, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A single unit of tracked work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable unique ID
    pub id: String,
    /// Title, never empty after trim
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Weak reference to a project; may point at a project that no longer exists
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly while status is done
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Task {
    /// Build a fresh task in `todo` status. `title` is stored as given.
    pub fn new(title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::default(),
            project_id: None,
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            is_pinned: false,
            tags: BTreeSet::new(),
        }
    }

    /// Structural validity check used when loading stored data.
    ///
    /// Status and priority membership is guaranteed by decoding; this checks
    /// the remaining constraints: non-empty id and title, and
    /// `completed_at.is_some() == (status == done)`.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.title.trim().is_empty()
            && self.completed_at.is_some() == self.status.is_done()
    }

    /// Calendar day the task was completed on, if it is completed
    pub fn completed_day(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Move to `status`, keeping `completed_at` consistent with it.
    ///
    /// Entering done stamps `now` only if no completion time exists yet, so
    /// re-marking a done task is idempotent.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        if status.is_done() {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }

    /// Refresh `updated_at`, never letting it fall behind `created_at`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Case-insensitive match of `query` against title, description and tags
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&query))
                .unwrap_or(false)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// `None` falls back to the default project from settings
    pub project_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl TaskInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a task. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub is_pinned: Option<bool>,
    pub tags: Option<BTreeSet<String>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Trim a free-text field, mapping blank text to `None`
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim tags and drop blank ones
pub fn normalize_tags<I>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
