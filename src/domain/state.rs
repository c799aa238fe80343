use super::project::{Project, DEFAULT_PROJECT_ID};
use super::settings::Settings;
use super::task::Task;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written by this build
pub const CURRENT_VERSION: u32 = 1;

/// Number of tasks completed on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionHistoryEntry {
    /// Day key, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub count: u32,
}

/// The whole durable unit, written as one blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u32,
    /// Newest first
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub settings: Settings,
    pub completion_history: Vec<CompletionHistoryEntry>,
}

impl PersistedState {
    /// First-run state: an Inbox project, no tasks, onboarding on
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_VERSION,
            tasks: Vec::new(),
            projects: vec![Project::inbox(now)],
            settings: Settings {
                show_onboarding: true,
                default_project_id: Some(DEFAULT_PROJECT_ID.to_string()),
                ..Settings::default()
            },
            completion_history: Vec::new(),
        }
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
