use crate::domain::{CompletionHistoryEntry, Task};
use std::collections::BTreeMap;

/// Per-day counts of completed tasks, ascending by day.
///
/// Only tasks with a completion time contribute; the day is the calendar
/// date of `completed_at`.
pub fn compute_completion_history(tasks: &[Task]) -> Vec<CompletionHistoryEntry> {
    let mut by_day = BTreeMap::new();
    for day in tasks.iter().filter_map(Task::completed_day) {
        *by_day.entry(day).or_insert(0u32) += 1;
    }

    by_day
        .into_iter()
        .map(|(date, count)| CompletionHistoryEntry { date, count })
        .collect()
}
