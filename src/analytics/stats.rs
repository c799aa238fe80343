use crate::domain::{CompletionHistoryEntry, Task, TaskStatus};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

/// Upper bound on how far back a streak is traced
pub const STREAK_LOOKBACK_DAYS: i64 = 365;

/// Read-only analytics snapshot handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Todo plus in-progress; archived tasks count toward neither bucket
    pub active_tasks: usize,
    /// In `[0, 1]`; zero for an empty list
    pub completion_rate: f64,
    pub streak_days: u32,
    pub tasks_completed_today: u32,
}

/// Summarize `tasks` as seen on `today`
pub fn compute_analytics(
    tasks: &[Task],
    history: &[CompletionHistoryEntry],
    today: NaiveDate,
) -> Summary {
    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let active_tasks = tasks.iter().filter(|t| t.status.is_active()).count();

    let completion_rate = if total_tasks == 0 {
        0.0
    } else {
        completed_tasks as f64 / total_tasks as f64
    };

    let tasks_completed_today = tasks_completed_today_from_history(history, today)
        .unwrap_or_else(|| tasks_completed_today_from_tasks(tasks, today));

    Summary {
        total_tasks,
        completed_tasks,
        active_tasks,
        completion_rate,
        streak_days: streak_days(tasks, history, today),
        tasks_completed_today,
    }
}

/// Count recorded in the history entry for `today`, if there is one
pub fn tasks_completed_today_from_history(
    history: &[CompletionHistoryEntry],
    today: NaiveDate,
) -> Option<u32> {
    history.iter().find(|e| e.date == today).map(|e| e.count)
}

/// Count of tasks whose completion time falls on `today`, scanning tasks directly
pub fn tasks_completed_today_from_tasks(tasks: &[Task], today: NaiveDate) -> u32 {
    tasks.iter().filter(|t| completed_on(t, today)).count() as u32
}

pub fn completed_on(task: &Task, day: NaiveDate) -> bool {
    task.completed_day() == Some(day)
}

/// Consecutive days, ending today, with at least one completion.
///
/// A day counts if it appears in `history` or any task was completed on it.
/// The walk stops at the first empty day and never looks further back than
/// [`STREAK_LOOKBACK_DAYS`].
pub fn streak_days(tasks: &[Task], history: &[CompletionHistoryEntry], today: NaiveDate) -> u32 {
    let mut active_days: HashSet<NaiveDate> = history
        .iter()
        .filter(|e| e.count > 0)
        .map(|e| e.date)
        .collect();
    active_days.extend(tasks.iter().filter_map(Task::completed_day));

    let mut streak = 0;
    for offset in 0..STREAK_LOOKBACK_DAYS {
        let day = today - Duration::days(offset);
        if !active_days.contains(&day) {
            break;
        }
        streak += 1;
    }
    streak
}
