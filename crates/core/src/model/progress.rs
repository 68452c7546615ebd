use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{ScreenId, TaskId};

/// Number of segments in the reward indicator and the cap of the displayed ratio.
pub const MAX_POINTS: u32 = 8;

/// Count as shown by the reward indicator, capped at `MAX_POINTS`.
#[must_use]
pub fn displayed_points(count: u32) -> u32 {
    count.min(MAX_POINTS)
}

/// Title text of a reward panel, e.g. `"3/8"`.
#[must_use]
pub fn format_title(count: u32) -> String {
    format!("{}/{MAX_POINTS}", displayed_points(count))
}

/// Durable game progress: where the player is and which tasks were collected.
///
/// Serialized as `{ currentScreen, currentTaskId, completed }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    current_screen: ScreenId,
    current_task_id: Option<TaskId>,
    completed: BTreeMap<TaskId, bool>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new(ScreenId::start())
    }
}

impl ProgressState {
    /// Fresh progress positioned on `start_screen`.
    #[must_use]
    pub fn new(start_screen: ScreenId) -> Self {
        Self {
            current_screen: start_screen,
            current_task_id: None,
            completed: BTreeMap::new(),
        }
    }

    /// Rebuild a record from already-normalized persisted fields.
    #[must_use]
    pub fn from_persisted(
        current_screen: ScreenId,
        current_task_id: Option<TaskId>,
        completed: BTreeMap<TaskId, bool>,
    ) -> Self {
        Self {
            current_screen,
            current_task_id,
            completed,
        }
    }

    #[must_use]
    pub fn current_screen(&self) -> &ScreenId {
        &self.current_screen
    }

    #[must_use]
    pub fn current_task_id(&self) -> Option<&TaskId> {
        self.current_task_id.as_ref()
    }

    #[must_use]
    pub fn is_completed(&self, task: &TaskId) -> bool {
        self.completed.get(task).copied().unwrap_or(false)
    }

    /// Number of tasks whose completion flag is `true`.
    #[must_use]
    pub fn completed_count(&self) -> u32 {
        let count = self.completed.values().filter(|done| **done).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn completed(&self) -> impl Iterator<Item = (&TaskId, bool)> {
        self.completed.iter().map(|(id, done)| (id, *done))
    }

    pub fn set_current_screen(&mut self, screen: ScreenId) {
        self.current_screen = screen;
    }

    pub fn set_current_task(&mut self, task: TaskId) {
        self.current_task_id = Some(task);
    }

    /// Flag `task` as completed. Returns `true` only when the flag flipped.
    ///
    /// There is deliberately no way to clear a flag once set.
    pub fn mark_completed(&mut self, task: &TaskId) -> bool {
        if self.is_completed(task) {
            return false;
        }
        self.completed.insert(task.clone(), true);
        true
    }
}
