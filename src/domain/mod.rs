pub mod enums;
pub mod project;
pub mod settings;
pub mod state;
pub mod task;
pub mod views;

pub use enums::{Priority, TaskStatus};
pub use project::{find_project, Project, DEFAULT_PROJECT_COLOR, DEFAULT_PROJECT_ID};
pub use settings::{Settings, SettingsPatch};
pub use state::{CompletionHistoryEntry, PersistedState, CURRENT_VERSION};
pub use task::{normalize_tags, normalize_text, Task, TaskInput, TaskPatch};
pub use views::{
    filter_tasks, group_by_project, sort_for_display, status_badge, StatusFilter, TaskFilter,
};
