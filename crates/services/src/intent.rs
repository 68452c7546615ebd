use quest_core::model::TaskId;

use crate::stage::PanelId;

/// Everything on stage that the player can activate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    StartButton,
    BackButton,
    TaskItem(TaskId),
    /// Back button inside a reward panel.
    ResultBack(PanelId),
    /// One rendering of a panel's collect affordance. Each render replaces the
    /// node, so each generation is a distinct target.
    Collect { panel: PanelId, generation: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Back,
    OpenTask(TaskId),
    Award {
        task: TaskId,
        panel: PanelId,
        generation: u32,
    },
}
