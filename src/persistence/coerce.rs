use crate::analytics::compute_completion_history;
use crate::domain::{PersistedState, Project, Settings, Task, CURRENT_VERSION};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Reasons a stored blob cannot be used at all
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("stored state is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("stored state is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Turn a raw stored blob into a valid state.
///
/// Only an unparseable blob or a non-object top level is an error. Everything
/// below that is coerced: non-array collections become empty, malformed
/// tasks and projects are dropped, a task's `updatedAt` is raised to its
/// `createdAt` when it predates it, settings are repaired field by field, the
/// version is normalized to the current one and completion history is
/// rebuilt from the surviving tasks.
pub fn decode_state(raw: &str) -> Result<PersistedState, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let root = match value {
        Value::Object(root) => root,
        other => return Err(DecodeError::NotAnObject(json_kind(&other))),
    };

    match root.get("version").and_then(Value::as_u64) {
        Some(v) if v == u64::from(CURRENT_VERSION) => {}
        other => log::debug!("stored version {:?} treated as {}", other, CURRENT_VERSION),
    }

    let mut tasks = coerce_list(&root, "tasks", Task::is_well_formed, |t: &Task| t.id.clone());
    for task in &mut tasks {
        if task.updated_at < task.created_at {
            log::warn!("task {} was updated before it was created, clamping", task.id);
            let stamp = task.updated_at;
            task.touch(stamp);
        }
    }
    let projects = coerce_list(&root, "projects", Project::is_well_formed, |p: &Project| {
        p.id.clone()
    });
    let settings = coerce_settings(root.get("settings"));
    let completion_history = compute_completion_history(&tasks);

    Ok(PersistedState {
        version: CURRENT_VERSION,
        tasks,
        projects,
        settings,
        completion_history,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode `root[field]` as a list, keeping only valid entries with unseen IDs
fn coerce_list<T, V, K>(root: &Map<String, Value>, field: &str, is_valid: V, key: K) -> Vec<T>
where
    T: DeserializeOwned,
    V: Fn(&T) -> bool,
    K: Fn(&T) -> String,
{
    let items = match root.get(field) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            log::warn!("stored {} is a {}, using an empty list", field, json_kind(other));
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(entry) if is_valid(&entry) && seen.insert(key(&entry)) => kept.push(entry),
            Ok(_) => log::warn!("dropping invalid or duplicate {} entry at index {}", field, index),
            Err(e) => log::warn!("dropping malformed {} entry at index {}: {}", field, index, e),
        }
    }
    kept
}

/// Repair settings field by field, falling back to defaults per field
fn coerce_settings(value: Option<&Value>) -> Settings {
    let defaults = Settings::default();
    let Some(Value::Object(map)) = value else {
        if value.is_some() {
            log::warn!("stored settings are not an object, using defaults");
        }
        return defaults;
    };

    let flag = |name: &str, fallback: bool| match map.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            log::warn!("settings.{} is not a boolean, using {}", name, fallback);
            fallback
        }
        None => fallback,
    };

    let default_project_id = match map.get("defaultProjectId") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            log::warn!("settings.defaultProjectId is malformed, clearing it");
            defaults.default_project_id.clone()
        }
    };

    Settings {
        confirm_before_delete: flag("confirmBeforeDelete", defaults.confirm_before_delete),
        enable_sounds: flag("enableSounds", defaults.enable_sounds),
        show_onboarding: flag("showOnboarding", defaults.show_onboarding),
        default_project_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn task_json(id: &str, status: &str, completed_at: Option<&str>) -> Value {
        json!({
            "id": id,
            "title": format!("task {id}"),
            "status": status,
            "priority": "high",
            "createdAt": "2024-03-01T09:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z",
            "completedAt": completed_at,
            "tags": ["b", "a"]
        })
    }

    #[test]
    fn test_rejects_unparseable_and_non_objects() {
        assert!(matches!(decode_state("{not json"), Err(DecodeError::Parse(_))));
        assert!(matches!(decode_state("[]"), Err(DecodeError::NotAnObject("array"))));
        assert!(matches!(decode_state("42"), Err(DecodeError::NotAnObject("number"))));
        assert!(matches!(decode_state("null"), Err(DecodeError::NotAnObject("null"))));
    }

    #[test]
    fn test_empty_object_gets_defaults() {
        let state = decode_state("{}").unwrap();
        assert_eq!(state.version, CURRENT_VERSION);
        assert!(state.tasks.is_empty());
        assert!(state.projects.is_empty());
        assert_eq!(state.settings, Settings::default());
        assert!(state.completion_history.is_empty());
    }

    #[test]
    fn test_non_array_collections_become_empty() {
        let raw = json!({
            "version": 1,
            "tasks": {"id": "x"},
            "projects": "inbox",
            "completionHistory": 3
        });
        let state = decode_state(&raw.to_string()).unwrap();
        assert!(state.tasks.is_empty());
        assert!(state.projects.is_empty());
        assert!(state.completion_history.is_empty());
    }

    #[test]
    fn test_malformed_tasks_are_dropped_individually() {
        let raw = json!({
            "tasks": [
                task_json("ok", "todo", None),
                task_json("bad-status", "finished", None),
                task_json("done-without-stamp", "done", None),
                task_json("", "todo", None),
                task_json("ok", "todo", None),
                task_json("done", "done", Some("2024-03-02T08:00:00Z")),
                "not an object"
            ]
        });
        let state = decode_state(&raw.to_string()).unwrap();

        let ids: Vec<&str> = state.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "done"]);
        assert_eq!(state.tasks[1].status, TaskStatus::Done);
        assert_eq!(state.completion_history.len(), 1);
        assert_eq!(state.completion_history[0].date.to_string(), "2024-03-02");
    }

    #[test]
    fn test_updated_at_before_created_at_is_clamped() {
        let mut stale = task_json("stale", "todo", None);
        stale["createdAt"] = json!("2024-03-05T09:00:00Z");
        stale["updatedAt"] = json!("2024-03-01T09:00:00Z");
        let raw = json!({ "tasks": [stale, task_json("fresh", "todo", None)] });
        let state = decode_state(&raw.to_string()).unwrap();

        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.tasks[0].updated_at, state.tasks[0].created_at);
        assert!(state.tasks.iter().all(|t| t.updated_at >= t.created_at));
        assert_eq!(state.tasks[1].updated_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_settings_repaired_per_field() {
        let raw = json!({
            "settings": {
                "confirmBeforeDelete": false,
                "enableSounds": "yes",
                "defaultProjectId": 7
            }
        });
        let state = decode_state(&raw.to_string()).unwrap();

        assert!(!state.settings.confirm_before_delete);
        assert!(state.settings.enable_sounds);
        assert!(state.settings.show_onboarding);
        assert!(state.settings.default_project_id.is_none());
    }

    #[test]
    fn test_unknown_version_is_treated_as_current() {
        let state = decode_state(&json!({"version": 99}).to_string()).unwrap();
        assert_eq!(state.version, CURRENT_VERSION);

        let state = decode_state(&json!({"version": "one"}).to_string()).unwrap();
        assert_eq!(state.version, CURRENT_VERSION);
    }

    #[test]
    fn test_stored_history_is_rebuilt_from_tasks() {
        let raw = json!({
            "tasks": [task_json("done", "done", Some("2024-03-02T08:00:00Z"))],
            "completionHistory": [{"date": "1999-01-01", "count": 40}]
        });
        let state = decode_state(&raw.to_string()).unwrap();
        assert_eq!(state.completion_history.len(), 1);
        assert_eq!(state.completion_history[0].count, 1);
    }
}
