use crate::analytics::{compute_analytics, Summary};
use crate::clock::Clock;
use crate::domain::{PersistedState, SettingsPatch, TaskInput, TaskPatch, TaskStatus};
use crate::engine::{reduce, Action, EngineState};
use crate::persistence::{Gateway, KeyValueStore};

/// Owns the live session: hydrates once from storage, applies actions
/// through the reducer, keeps analytics current and writes every change back.
///
/// All mutation goes through `&mut self`, so transitions never interleave.
pub struct App<S: KeyValueStore, C: Clock> {
    gateway: Gateway<S>,
    clock: C,
    state: EngineState,
    analytics: Summary,
    hydrated: bool,
    last_warning: Option<String>,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    /// Create an unhydrated session; nothing is read until [`App::hydrate`]
    /// or the first dispatch.
    pub fn new(gateway: Gateway<S>, clock: C) -> Self {
        let state = EngineState::new(gateway.initial_state(clock.now()));
        let analytics = Self::summarize(&state, &clock);
        Self {
            gateway,
            clock,
            state,
            analytics,
            hydrated: false,
            last_warning: None,
        }
    }

    /// Load persisted state into the session. Only the first call reads
    /// storage; later calls return `false` and change nothing.
    pub fn hydrate(&mut self) -> bool {
        if self.hydrated {
            return false;
        }

        let loaded = self.gateway.load(self.clock.now());
        self.hydrate_with(loaded);
        true
    }

    /// Apply one action, then recompute analytics and persist if the durable
    /// data changed.
    ///
    /// A dispatched `Hydrate` goes through the same once-only guard as
    /// [`App::hydrate`]: before hydration its payload replaces the storage
    /// read, afterwards it is ignored. Hydration never writes.
    pub fn dispatch(&mut self, action: Action) -> &Summary {
        if let Action::Hydrate(payload) = action {
            if self.hydrated {
                log::debug!("hydrate: already hydrated, ignoring");
            } else {
                self.hydrate_with(payload);
            }
            return &self.analytics;
        }

        if !self.hydrated {
            self.hydrate();
        }

        let name = action.name();
        let next = reduce(&self.state, action, self.clock.now());
        let data_changed = next.data != self.state.data;
        self.state = next;
        self.refresh_analytics();

        if data_changed {
            log::debug!("{}: state changed, saving", name);
            let outcome = self.gateway.save(&self.state.data);
            self.last_warning = outcome.warning().map(str::to_string);
        } else {
            log::debug!("{}: no change", name);
        }

        &self.analytics
    }

    pub fn state(&self) -> &PersistedState {
        &self.state.data
    }

    pub fn engine_state(&self) -> &EngineState {
        &self.state
    }

    /// Snapshot recomputed after every action
    pub fn analytics(&self) -> &Summary {
        &self.analytics
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn can_undo(&self) -> bool {
        self.state.can_undo()
    }

    /// Advisory from the most recent failed save, if any
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn clear_warning(&mut self) {
        self.last_warning = None;
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    /// Create a task and return its ID, or `None` if the title was blank
    pub fn create_task(&mut self, input: TaskInput) -> Option<String> {
        let before = self.state.data.tasks.len();
        self.dispatch(Action::CreateTask(input));
        if self.state.data.tasks.len() > before {
            self.state.data.tasks.first().map(|t| t.id.clone())
        } else {
            None
        }
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) {
        self.dispatch(Action::UpdateTask {
            id: id.to_string(),
            patch,
        });
    }

    pub fn delete_task(&mut self, id: &str) {
        self.dispatch(Action::DeleteTask(id.to_string()));
    }

    pub fn bulk_update_status<I, T>(&mut self, ids: I, status: TaskStatus)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.dispatch(Action::bulk_status(ids, status));
    }

    pub fn restore_last_deleted(&mut self) {
        self.dispatch(Action::RestoreLastDeleted);
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.dispatch(Action::UpdateSettings(patch));
    }

    /// Create a project and return its ID, or `None` if the name was blank
    pub fn create_project(&mut self, name: &str, color: &str) -> Option<String> {
        let before = self.state.data.projects.len();
        self.dispatch(Action::CreateProject {
            name: name.to_string(),
            color: color.to_string(),
        });
        if self.state.data.projects.len() > before {
            self.state.data.projects.last().map(|p| p.id.clone())
        } else {
            None
        }
    }

    pub fn delete_project(&mut self, id: &str) {
        self.dispatch(Action::DeleteProject(id.to_string()));
    }

    pub fn toggle_complete(&mut self, id: &str) {
        self.dispatch(Action::ToggleComplete(id.to_string()));
    }

    pub fn toggle_pin(&mut self, id: &str) {
        self.dispatch(Action::TogglePin(id.to_string()));
    }

    fn hydrate_with(&mut self, loaded: PersistedState) {
        let now = self.clock.now();
        self.state = reduce(&self.state, Action::Hydrate(loaded), now);
        self.hydrated = true;
        self.refresh_analytics();
        log::debug!("hydrated {} tasks", self.state.data.tasks.len());
    }

    fn refresh_analytics(&mut self) {
        self.analytics = Self::summarize(&self.state, &self.clock);
    }

    fn summarize(state: &EngineState, clock: &C) -> Summary {
        compute_analytics(
            &state.data.tasks,
            &state.data.completion_history,
            clock.today(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::Priority;
    use crate::persistence::{MemoryStore, DEFAULT_STORAGE_KEY};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap()
    }

    fn create_test_app() -> (App<MemoryStore, ManualClock>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        let app = App::new(Gateway::new(store.clone()), clock.clone());
        (app, store, clock)
    }

    #[test]
    fn test_hydrate_runs_once() {
        let (mut app, store, clock) = create_test_app();
        assert!(!app.is_hydrated());

        assert!(app.hydrate());
        let id = app.create_task(TaskInput::titled("Persisted")).unwrap();

        // Storage changes behind the session's back are not re-read
        store.insert_raw(DEFAULT_STORAGE_KEY, "{}");
        clock.advance(Duration::minutes(5));
        assert!(!app.hydrate());
        assert!(app.state().find_task(&id).is_some());
    }

    #[test]
    fn test_hydrate_loads_saved_state() {
        let (mut app, store, clock) = create_test_app();
        let id = app.create_task(TaskInput::titled("Carry over")).unwrap();
        app.toggle_complete(&id);

        let mut next_session = App::new(Gateway::new(store), clock);
        next_session.hydrate();
        assert_eq!(next_session.state(), app.state());
        assert_eq!(next_session.analytics().completed_tasks, 1);
        assert!(!next_session.can_undo());
    }

    #[test]
    fn test_dispatched_hydrate_after_hydrate_is_ignored() {
        let (mut app, store, _clock) = create_test_app();
        app.hydrate();
        let before = app.state().clone();

        let mut other = PersistedState::initial(start());
        other.settings.enable_sounds = false;
        other.projects.clear();
        app.dispatch(Action::Hydrate(other));

        assert_eq!(app.state(), &before);
        assert!(store.raw(DEFAULT_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_dispatched_hydrate_stands_in_for_storage() {
        let (mut app, store, _clock) = create_test_app();
        let mut stored = PersistedState::initial(start());
        stored.settings.show_onboarding = false;
        store.insert_raw(DEFAULT_STORAGE_KEY, &serde_json::to_string(&stored).unwrap());

        let mut payload = PersistedState::initial(start());
        payload.settings.enable_sounds = false;
        app.dispatch(Action::Hydrate(payload.clone()));

        assert!(app.is_hydrated());
        assert_eq!(app.state(), &payload);
        assert!(!app.hydrate());
        let raw = store.raw(DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(serde_json::from_str::<PersistedState>(&raw).unwrap(), stored);
    }

    #[test]
    fn test_first_dispatch_hydrates() {
        let (mut app, store, _clock) = create_test_app();
        let mut seeded = PersistedState::initial(start());
        seeded.settings.enable_sounds = false;
        store.insert_raw(DEFAULT_STORAGE_KEY, &serde_json::to_string(&seeded).unwrap());

        app.create_task(TaskInput::titled("after load"));
        assert!(app.is_hydrated());
        assert!(!app.state().settings.enable_sounds);
        assert_eq!(app.state().tasks.len(), 1);
    }

    #[test]
    fn test_every_change_is_saved() {
        let (mut app, store, _clock) = create_test_app();
        app.hydrate();
        assert!(store.raw(DEFAULT_STORAGE_KEY).is_none());

        let id = app.create_task(TaskInput::titled("Write tests")).unwrap();
        let saved: PersistedState =
            serde_json::from_str(&store.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(saved.tasks[0].id, id);

        app.update_task(
            &id,
            TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        );
        let saved: PersistedState =
            serde_json::from_str(&store.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(saved.tasks[0].priority, Priority::High);
    }

    #[test]
    fn test_noop_actions_do_not_write() {
        let (mut app, store, _clock) = create_test_app();
        app.hydrate();

        app.delete_task("missing");
        app.restore_last_deleted();
        assert!(app.create_task(TaskInput::titled("   ")).is_none());
        assert!(store.raw(DEFAULT_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_analytics_follow_actions() {
        let (mut app, _store, clock) = create_test_app();
        let a = app.create_task(TaskInput::titled("a")).unwrap();
        let b = app.create_task(TaskInput::titled("b")).unwrap();
        app.create_task(TaskInput::titled("c"));
        assert_eq!(app.analytics().total_tasks, 3);
        assert_eq!(app.analytics().completion_rate, 0.0);

        app.toggle_complete(&a);
        clock.advance(Duration::days(1));
        app.toggle_complete(&b);

        let summary = app.analytics().clone();
        assert_eq!(summary.completed_tasks, 2);
        assert_eq!(summary.active_tasks, 1);
        assert_eq!(summary.streak_days, 2);
        assert_eq!(summary.tasks_completed_today, 1);
    }

    #[test]
    fn test_undo_through_app() {
        let (mut app, _store, _clock) = create_test_app();
        let id = app.create_task(TaskInput::titled("oops")).unwrap();
        let before = app.state().find_task(&id).unwrap().clone();

        app.delete_task(&id);
        assert!(app.can_undo());
        assert_eq!(app.analytics().total_tasks, 0);

        app.restore_last_deleted();
        assert_eq!(app.state().tasks[0], before);
        assert!(!app.can_undo());
    }

    #[test]
    fn test_save_failure_keeps_session_usable() {
        let store = MemoryStore::with_quota(64);
        let clock = ManualClock::new(start());
        let mut app = App::new(Gateway::new(store.clone()), clock);

        let id = app.create_task(TaskInput::titled("too big to store")).unwrap();
        assert!(app.last_warning().unwrap().contains("could not be saved"));
        assert!(app.state().find_task(&id).is_some());
        assert!(store.raw(DEFAULT_STORAGE_KEY).is_none());

        app.clear_warning();
        assert!(app.last_warning().is_none());
    }

    #[test]
    fn test_projects_through_app() {
        let (mut app, _store, _clock) = create_test_app();
        let project = app.create_project("Garden", "green").unwrap();
        assert!(app.create_project("  ", "green").is_none());

        app.update_settings(SettingsPatch {
            default_project_id: Some(Some(project.clone())),
            ..SettingsPatch::default()
        });
        let id = app.create_task(TaskInput::titled("Plant tulips")).unwrap();
        let task = app.state().find_task(&id).unwrap();
        assert_eq!(task.project_id.as_deref(), Some(project.as_str()));

        app.delete_project(&project);
        assert!(app.state().settings.default_project_id.is_none());
        app.toggle_pin(&id);
        assert!(app.state().find_task(&id).unwrap().is_pinned);
    }

    #[test]
    fn test_bulk_update_through_app() {
        let (mut app, _store, _clock) = create_test_app();
        let a = app.create_task(TaskInput::titled("a")).unwrap();
        let b = app.create_task(TaskInput::titled("b")).unwrap();

        app.bulk_update_status([a.as_str(), b.as_str()], TaskStatus::InProgress);
        assert_eq!(app.analytics().active_tasks, 2);
        assert!(app
            .state()
            .tasks
            .iter()
            .all(|t| t.status == TaskStatus::InProgress));
    }
}
