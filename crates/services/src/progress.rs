use quest_core::model::{ProgressState, ScreenId, TaskId};
use storage::ProgressStore;
use tracing::debug;

use crate::stage::{ElementKey, Stage, Visual};

/// The single owned progress record. Every mutation goes through a method that
/// persists before returning.
pub struct ProgressSession {
    state: ProgressState,
    store: ProgressStore,
}

impl ProgressSession {
    /// Load the persisted record (or defaults) from `store`.
    #[must_use]
    pub fn load(store: ProgressStore) -> Self {
        let state = store.load();
        debug!(
            screen = %state.current_screen(),
            completed = state.completed_count(),
            "progress loaded"
        );
        Self { state, store }
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn record_screen(&mut self, screen: ScreenId) {
        self.state.set_current_screen(screen);
        self.store.save(&self.state);
    }

    /// Record `task` as the shown task, which implies the task screen.
    pub fn record_task(&mut self, task: TaskId, task_screen: ScreenId) {
        self.state.set_current_task(task);
        self.state.set_current_screen(task_screen);
        self.store.save(&self.state);
    }

    /// Returns `true` when `task` was newly completed (and persisted).
    pub fn record_completion(&mut self, task: &TaskId) -> bool {
        let flipped = self.state.mark_completed(task);
        if flipped {
            self.store.save(&self.state);
        }
        flipped
    }
}

/// Completion bookkeeping plus the "collected" marker on task-selector items.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    items: Vec<TaskId>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a selector item with `task` and sync its marker.
    pub fn register_item(&mut self, task: TaskId, session: &ProgressSession, stage: &mut Stage) {
        let key = ElementKey::TaskItem(task.clone());
        if !stage.contains(&key) {
            stage.register(key.clone(), Visual::shown());
        }
        stage.set_marked(&key, session.state().is_completed(&task));
        if !self.items.contains(&task) {
            self.items.push(task);
        }
    }

    #[must_use]
    pub fn items(&self) -> &[TaskId] {
        &self.items
    }

    #[must_use]
    pub fn completed_count(&self, session: &ProgressSession) -> u32 {
        session.state().completed_count()
    }

    /// Idempotent: only the first call changes state, every call re-syncs the marker.
    pub fn mark_completed(&self, task: &TaskId, session: &mut ProgressSession, stage: &mut Stage) -> bool {
        let flipped = session.record_completion(task);
        self.set_collected(task, session.state().is_completed(task), stage);
        flipped
    }

    pub fn sync_items(&self, session: &ProgressSession, stage: &mut Stage) {
        for task in &self.items {
            self.set_collected(task, session.state().is_completed(task), stage);
        }
    }

    /// Mark `task`'s item as the selected one, clearing the others.
    pub fn set_active_item(&self, task: &TaskId, stage: &mut Stage) {
        for item in &self.items {
            stage.set_active(&ElementKey::TaskItem(item.clone()), item == task);
        }
    }

    fn set_collected(&self, task: &TaskId, collected: bool, stage: &mut Stage) {
        if self.items.contains(task) {
            stage.set_marked(&ElementKey::TaskItem(task.clone()), collected);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storage::{InMemoryStore, KeyValueStore, PROGRESS_KEY};

    use super::*;

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    fn session(backend: &InMemoryStore) -> ProgressSession {
        ProgressSession::load(ProgressStore::new(
            Arc::new(backend.clone()),
            ScreenId::start(),
        ))
    }

    #[test]
    fn completion_persists_and_marks_item() {
        let backend = InMemoryStore::new();
        let mut session = session(&backend);
        let mut stage = Stage::new();
        let mut tracker = ProgressTracker::new();
        tracker.register_item(task("ai"), &session, &mut stage);

        assert!(tracker.mark_completed(&task("ai"), &mut session, &mut stage));
        assert!(!tracker.mark_completed(&task("ai"), &mut session, &mut stage));
        assert_eq!(tracker.completed_count(&session), 1);
        assert!(stage.visual(&ElementKey::TaskItem(task("ai"))).unwrap().marked);

        let raw = backend.get(PROGRESS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"ai\":true"), "unexpected record {raw}");
    }

    #[test]
    fn registered_items_pick_up_persisted_completion() {
        let backend = InMemoryStore::new();
        backend
            .set(PROGRESS_KEY, r#"{"currentScreen":"maps","completed":{"biohacking":true}}"#)
            .unwrap();
        let session = session(&backend);
        let mut stage = Stage::new();
        let mut tracker = ProgressTracker::new();
        tracker.register_item(task("biohacking"), &session, &mut stage);
        tracker.register_item(task("ai"), &session, &mut stage);

        assert!(stage.visual(&ElementKey::TaskItem(task("biohacking"))).unwrap().marked);
        assert!(!stage.visual(&ElementKey::TaskItem(task("ai"))).unwrap().marked);
    }

    #[test]
    fn active_item_is_exclusive() {
        let backend = InMemoryStore::new();
        let session = session(&backend);
        let mut stage = Stage::new();
        let mut tracker = ProgressTracker::new();
        for id in ["ai", "antifragility", "biohacking"] {
            tracker.register_item(task(id), &session, &mut stage);
        }

        tracker.set_active_item(&task("ai"), &mut stage);
        tracker.set_active_item(&task("biohacking"), &mut stage);
        let active: Vec<_> = tracker
            .items()
            .iter()
            .filter(|id| stage.visual(&ElementKey::TaskItem((*id).clone())).unwrap().active)
            .collect();
        assert_eq!(active, vec![&task("biohacking")]);
    }
}
