use crate::domain::{PersistedState, SettingsPatch, TaskInput, TaskPatch, TaskStatus};
use std::collections::HashSet;

/// Every transition the engine understands
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace all state with a loaded snapshot and clear the undo slot
    Hydrate(PersistedState),
    CreateTask(TaskInput),
    UpdateTask {
        id: String,
        patch: TaskPatch,
    },
    /// Remove a task, keeping it in the undo slot
    DeleteTask(String),
    BulkUpdateStatus {
        ids: HashSet<String>,
        status: TaskStatus,
    },
    RestoreLastDeleted,
    UpdateSettings(SettingsPatch),
    CreateProject {
        name: String,
        color: String,
    },
    /// Remove a project; tasks keep their now-dangling reference
    DeleteProject(String),
    /// Done becomes todo, anything else becomes done
    ToggleComplete(String),
    TogglePin(String),
}

impl Action {
    pub fn bulk_status<I, S>(ids: I, status: TaskStatus) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::BulkUpdateStatus {
            ids: ids.into_iter().map(Into::into).collect(),
            status,
        }
    }

    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hydrate(_) => "hydrate",
            Self::CreateTask(_) => "create-task",
            Self::UpdateTask { .. } => "update-task",
            Self::DeleteTask(_) => "delete-task",
            Self::BulkUpdateStatus { .. } => "bulk-update-status",
            Self::RestoreLastDeleted => "restore-last-deleted",
            Self::UpdateSettings(_) => "update-settings",
            Self::CreateProject { .. } => "create-project",
            Self::DeleteProject(_) => "delete-project",
            Self::ToggleComplete(_) => "toggle-complete",
            Self::TogglePin(_) => "toggle-pin",
        }
    }
}
