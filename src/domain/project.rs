use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of the project created on first run
pub const DEFAULT_PROJECT_ID: &str = "inbox";

/// Color token used when none is given
pub const DEFAULT_PROJECT_COLOR: &str = "slate";

/// Named bucket that tasks may reference by ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Color token understood by the rendering layer (e.g. "slate", "teal")
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, color: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            color,
            created_at: now,
        }
    }

    /// The "Inbox" project every fresh state starts with
    pub fn inbox(now: DateTime<Utc>) -> Self {
        Self {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: "Inbox".to_string(),
            color: DEFAULT_PROJECT_COLOR.to_string(),
            created_at: now,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Look up a project by ID. Dangling references resolve to `None`.
pub fn find_project<'a>(projects: &'a [Project], id: Option<&str>) -> Option<&'a Project> {
    let id = id?;
    projects.iter().find(|p| p.id == id)
}
