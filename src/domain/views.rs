use super::enums::TaskStatus;
use super::project::{find_project, Project};
use super::task::Task;

/// Which statuses a task list should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Todo and in-progress
    Active,
    Done,
    Archived,
    Exactly(TaskStatus),
}

impl StatusFilter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "done" => Some(Self::Done),
            "archived" => Some(Self::Archived),
            other => TaskStatus::from_name(other).map(Self::Exactly),
        }
    }

    pub fn accepts(&self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Active => status.is_active(),
            Self::Done => status == TaskStatus::Done,
            Self::Archived => status == TaskStatus::Archived,
            Self::Exactly(wanted) => status == *wanted,
        }
    }
}

/// Read-side filter for task lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub project_id: Option<String>,
    pub tag: Option<String>,
    /// Free-text search over title, description and tags
    pub query: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.accepts(task.status) {
            return false;
        }
        if let Some(project_id) = &self.project_id {
            if task.project_id.as_deref() != Some(project_id.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !task.tags.contains(tag.trim()) {
                return false;
            }
        }
        match &self.query {
            Some(query) => task.matches_query(query),
            None => true,
        }
    }
}

/// Tasks passing `filter`, in their stored order
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Pinned tasks first; relative order is otherwise preserved
pub fn sort_for_display(tasks: &mut [&Task]) {
    tasks.sort_by_key(|t| !t.is_pinned);
}

/// Tasks grouped under their project, in project order.
///
/// Tasks without a project, or referencing one that no longer exists, are
/// collected in a trailing group keyed by `None`. Empty groups are omitted.
pub fn group_by_project<'a>(
    tasks: &'a [Task],
    projects: &'a [Project],
) -> Vec<(Option<&'a Project>, Vec<&'a Task>)> {
    let mut groups: Vec<(Option<&Project>, Vec<&Task>)> =
        projects.iter().map(|p| (Some(p), Vec::new())).collect();
    let mut ungrouped = Vec::new();

    for task in tasks {
        match find_project(projects, task.project_id.as_deref()) {
            Some(project) => {
                if let Some((_, bucket)) = groups
                    .iter_mut()
                    .find(|(p, _)| p.map(|p| p.id == project.id).unwrap_or(false))
                {
                    bucket.push(task);
                }
            }
            None => ungrouped.push(task),
        }
    }

    groups.push((None, ungrouped));
    groups.retain(|(_, bucket)| !bucket.is_empty());
    groups
}

/// Checkbox-style marker for a status
pub fn status_badge(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Done => "[x]",
        TaskStatus::Archived => "[-]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(title: &str, status: TaskStatus, project: Option<&str>) -> Task {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let mut task = Task::new(title.to_string(), now);
        task.set_status(status, now);
        task.project_id = project.map(str::to_string);
        task
    }

    #[test]
    fn test_status_filter() {
        assert!(StatusFilter::Active.accepts(TaskStatus::InProgress));
        assert!(!StatusFilter::Active.accepts(TaskStatus::Archived));
        assert!(StatusFilter::All.accepts(TaskStatus::Archived));
        assert_eq!(
            StatusFilter::from_name("in-progress"),
            Some(StatusFilter::Exactly(TaskStatus::InProgress))
        );
        assert_eq!(StatusFilter::from_name("active"), Some(StatusFilter::Active));
        assert_eq!(StatusFilter::from_name("bogus"), None);
    }

    #[test]
    fn test_filter_tasks_combines_criteria() {
        let mut tagged = task("Call plumber", TaskStatus::Todo, Some("home"));
        tagged.tags.insert("phone".to_string());
        let tasks = vec![
            tagged,
            task("Call bank", TaskStatus::Done, Some("home")),
            task("Write memo", TaskStatus::Todo, Some("work")),
        ];

        let filter = TaskFilter {
            status: StatusFilter::Active,
            project_id: Some("home".to_string()),
            ..TaskFilter::default()
        };
        let found = filter_tasks(&tasks, &filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Call plumber");

        let filter = TaskFilter {
            query: Some("call".to_string()),
            ..TaskFilter::default()
        };
        assert_eq!(filter_tasks(&tasks, &filter).len(), 2);

        let filter = TaskFilter {
            tag: Some("phone".to_string()),
            ..TaskFilter::default()
        };
        assert_eq!(filter_tasks(&tasks, &filter).len(), 1);
    }

    #[test]
    fn test_sort_for_display_pins_first() {
        let a = task("a", TaskStatus::Todo, None);
        let mut b = task("b", TaskStatus::Todo, None);
        b.is_pinned = true;
        let c = task("c", TaskStatus::Todo, None);

        let mut list = vec![&a, &b, &c];
        sort_for_display(&mut list);
        let titles: Vec<&str> = list.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_group_by_project_handles_dangling_ids() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let projects = vec![Project::inbox(now)];
        let tasks = vec![
            task("in inbox", TaskStatus::Todo, Some("inbox")),
            task("orphan", TaskStatus::Todo, Some("removed-project")),
            task("loose", TaskStatus::Todo, None),
        ];

        let groups = group_by_project(&tasks, &projects);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.map(|p| p.id.as_str()), Some("inbox"));
        assert_eq!(groups[0].1.len(), 1);
        assert!(groups[1].0.is_none());
        assert_eq!(groups[1].1.len(), 2);
    }
}
