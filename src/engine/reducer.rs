use super::action::Action;
use crate::analytics::compute_completion_history;
use crate::domain::{
    normalize_tags, normalize_text, PersistedState, Project, SettingsPatch, Task, TaskInput,
    TaskPatch, TaskStatus, DEFAULT_PROJECT_COLOR,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Live engine state: the durable data plus the volatile undo slot
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub data: PersistedState,
    /// Most recently deleted task. Never persisted.
    pub undo: Option<Task>,
}

impl EngineState {
    pub fn new(data: PersistedState) -> Self {
        Self { data, undo: None }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_some()
    }
}

/// Apply `action` to `state`, producing the next state.
///
/// Total: unknown ids and unusable input leave the state unchanged. The input
/// state is never modified; every changed task is a new record, so a task held
/// in the undo slot is never shared with the live list.
pub fn reduce(state: &EngineState, action: Action, now: DateTime<Utc>) -> EngineState {
    match action {
        Action::Hydrate(data) => EngineState::new(data),
        Action::CreateTask(input) => create_task(state, input, now),
        Action::UpdateTask { id, patch } => {
            map_task(state, &id, |task| apply_patch(task, patch, now))
        }
        Action::DeleteTask(id) => delete_task(state, &id),
        Action::BulkUpdateStatus { ids, status } => bulk_update_status(state, &ids, status, now),
        Action::RestoreLastDeleted => restore_last_deleted(state),
        Action::UpdateSettings(patch) => update_settings(state, &patch),
        Action::CreateProject { name, color } => create_project(state, &name, &color, now),
        Action::DeleteProject(id) => delete_project(state, &id),
        Action::ToggleComplete(id) => map_task(state, &id, |task| {
            let mut next = task.clone();
            let status = if task.status.is_done() {
                TaskStatus::Todo
            } else {
                TaskStatus::Done
            };
            next.set_status(status, now);
            next.touch(now);
            next
        }),
        Action::TogglePin(id) => map_task(state, &id, |task| {
            let mut next = task.clone();
            next.is_pinned = !task.is_pinned;
            next.touch(now);
            next
        }),
    }
}

/// New state with `tasks` swapped in and completion history rebuilt
fn with_tasks(state: &EngineState, tasks: Vec<Task>, undo: Option<Task>) -> EngineState {
    let completion_history = compute_completion_history(&tasks);
    EngineState {
        data: PersistedState {
            tasks,
            completion_history,
            ..state.data.clone()
        },
        undo,
    }
}

fn create_task(state: &EngineState, input: TaskInput, now: DateTime<Utc>) -> EngineState {
    let title = input.title.trim();
    if title.is_empty() {
        return state.clone();
    }

    let mut task = Task::new(title.to_string(), now);
    task.description = normalize_text(input.description);
    task.priority = input.priority.unwrap_or_default();
    task.project_id = normalize_text(input.project_id)
        .or_else(|| state.data.settings.default_project_id.clone());
    task.due_date = input.due_date;
    task.tags = normalize_tags(input.tags);

    let mut tasks = Vec::with_capacity(state.data.tasks.len() + 1);
    tasks.push(task);
    tasks.extend(state.data.tasks.iter().cloned());
    with_tasks(state, tasks, state.undo.clone())
}

/// Replace the task with `id` by `f(task)`; unchanged state if absent
fn map_task<F>(state: &EngineState, id: &str, f: F) -> EngineState
where
    F: FnOnce(&Task) -> Task,
{
    let Some(pos) = state.data.tasks.iter().position(|t| t.id == id) else {
        return state.clone();
    };

    let mut tasks = state.data.tasks.clone();
    tasks[pos] = f(&state.data.tasks[pos]);
    with_tasks(state, tasks, state.undo.clone())
}

fn apply_patch(task: &Task, patch: TaskPatch, now: DateTime<Utc>) -> Task {
    let mut next = task.clone();

    if let Some(title) = patch.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        next.title = title.to_string();
    }
    if let Some(description) = patch.description {
        next.description = normalize_text(description);
    }
    if let Some(priority) = patch.priority {
        next.priority = priority;
    }
    if let Some(project_id) = patch.project_id {
        next.project_id = normalize_text(project_id);
    }
    if let Some(due_date) = patch.due_date {
        next.due_date = due_date;
    }
    if let Some(is_pinned) = patch.is_pinned {
        next.is_pinned = is_pinned;
    }
    if let Some(tags) = patch.tags {
        next.tags = normalize_tags(tags);
    }
    if let Some(completed_at) = patch.completed_at {
        next.completed_at = completed_at;
    }

    // Re-establish completed_at <=> done after the merge
    let status = patch.status.unwrap_or(next.status);
    next.set_status(status, now);
    next.touch(now);
    next
}

fn delete_task(state: &EngineState, id: &str) -> EngineState {
    let Some(pos) = state.data.tasks.iter().position(|t| t.id == id) else {
        return state.clone();
    };

    let mut tasks = state.data.tasks.clone();
    let removed = tasks.remove(pos);
    with_tasks(state, tasks, Some(removed))
}

fn bulk_update_status(
    state: &EngineState,
    ids: &HashSet<String>,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> EngineState {
    if !state.data.tasks.iter().any(|t| ids.contains(&t.id)) {
        return state.clone();
    }

    let tasks = state
        .data
        .tasks
        .iter()
        .map(|task| {
            let mut next = task.clone();
            if ids.contains(&task.id) {
                next.set_status(status, now);
                next.touch(now);
            }
            next
        })
        .collect();
    with_tasks(state, tasks, state.undo.clone())
}

fn restore_last_deleted(state: &EngineState) -> EngineState {
    let Some(task) = &state.undo else {
        return state.clone();
    };

    let mut tasks = Vec::with_capacity(state.data.tasks.len() + 1);
    tasks.push(task.clone());
    tasks.extend(state.data.tasks.iter().filter(|t| t.id != task.id).cloned());
    with_tasks(state, tasks, None)
}

fn update_settings(state: &EngineState, patch: &SettingsPatch) -> EngineState {
    let mut next = state.clone();
    next.data.settings = state.data.settings.merged(patch);
    next
}

fn create_project(state: &EngineState, name: &str, color: &str, now: DateTime<Utc>) -> EngineState {
    let name = name.trim();
    if name.is_empty() {
        return state.clone();
    }
    let color = match color.trim() {
        "" => DEFAULT_PROJECT_COLOR,
        color => color,
    };

    let mut next = state.clone();
    next.data
        .projects
        .push(Project::new(name.to_string(), color.to_string(), now));
    next
}

fn delete_project(state: &EngineState, id: &str) -> EngineState {
    if !state.data.projects.iter().any(|p| p.id == id) {
        return state.clone();
    }

    let mut next = state.clone();
    next.data.projects.retain(|p| p.id != id);
    if next.data.settings.default_project_id.as_deref() == Some(id) {
        next.data.settings.default_project_id = None;
    }
    next
}
