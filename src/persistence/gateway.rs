use super::coerce::decode_state;
use super::store::KeyValueStore;
use crate::domain::PersistedState;
use crate::error::StorageError;
use chrono::{DateTime, Utc};

/// Default storage key for the state blob
pub const DEFAULT_STORAGE_KEY: &str = "taskflow-state";

/// Result of a save attempt. Failures carry a message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Saved => None,
            Self::Failed(message) => Some(message),
        }
    }
}

/// Reads and writes the whole state as one blob under a single key.
///
/// Never fails outward: unreadable data yields the initial state and write
/// failures become a [`SaveOutcome::Failed`].
#[derive(Debug, Clone)]
pub struct Gateway<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// First-run state
    pub fn initial_state(&self, now: DateTime<Utc>) -> PersistedState {
        PersistedState::initial(now)
    }

    /// Load the stored state, or the initial state if nothing usable is stored
    pub fn load(&self, now: DateTime<Utc>) -> PersistedState {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("no stored state under {:?}, starting fresh", self.key);
                return self.initial_state(now);
            }
            Err(e) => {
                log::warn!("failed to read stored state: {}", e);
                return self.initial_state(now);
            }
        };

        match decode_state(&raw) {
            Ok(state) => {
                log::debug!(
                    "loaded {} tasks and {} projects",
                    state.tasks.len(),
                    state.projects.len()
                );
                state
            }
            Err(e) => {
                log::warn!("discarding stored state: {}", e);
                self.initial_state(now)
            }
        }
    }

    /// Serialize and write the full state. Never retried.
    pub fn save(&self, state: &PersistedState) -> SaveOutcome {
        let result = serde_json::to_string(state)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(&self.key, &json));

        match result {
            Ok(()) => SaveOutcome::Saved,
            Err(e) => {
                log::warn!("failed to save state: {}", e);
                SaveOutcome::Failed(format!("Changes could not be saved: {}", e))
            }
        }
    }
}
