use serde::{Deserialize, Serialize};

/// User preferences. Pure configuration with no derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub confirm_before_delete: bool,
    pub enable_sounds: bool,
    pub show_onboarding: bool,
    /// Project assigned to new tasks that do not name one
    pub default_project_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_before_delete: true,
            enable_sounds: true,
            show_onboarding: true,
            default_project_id: None,
        }
    }
}

/// Shallow partial update of [`Settings`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub confirm_before_delete: Option<bool>,
    pub enable_sounds: Option<bool>,
    pub show_onboarding: Option<bool>,
    pub default_project_id: Option<Option<String>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Settings {
    /// Return a copy with every field present in `patch` replaced
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            confirm_before_delete: patch
                .confirm_before_delete
                .unwrap_or(self.confirm_before_delete),
            enable_sounds: patch.enable_sounds.unwrap_or(self.enable_sounds),
            show_onboarding: patch.show_onboarding.unwrap_or(self.show_onboarding),
            default_project_id: patch
                .default_project_id
                .clone()
                .unwrap_or_else(|| self.default_project_id.clone()),
        }
    }
}
