use std::collections::HashSet;

use thiserror::Error;

use super::ids::{ScreenId, TaskId};
use super::progress::MAX_POINTS;

/// Which fragments a reward panel's markup actually provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelMarkup {
    pub collect: bool,
    pub ready: bool,
    pub title: bool,
    pub back_button: bool,
    /// Segment slots `1..=segments` are present.
    pub segments: u32,
}

impl PanelMarkup {
    /// A panel with every fragment present.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            collect: true,
            ready: true,
            title: true,
            back_button: true,
            segments: MAX_POINTS,
        }
    }

    #[must_use]
    pub fn has_segment(&self, index: u32) -> bool {
        (1..=self.segments.min(MAX_POINTS)).contains(&index)
    }
}

impl Default for PanelMarkup {
    fn default() -> Self {
        Self::complete()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLayout {
    pub id: TaskId,
    /// `None` when the task relies on the task screen's shared panel.
    pub result: Option<PanelMarkup>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("layout declares no screens")]
    NoScreens,
    #[error("screen {0} is declared twice")]
    DuplicateScreen(ScreenId),
    #[error("task {0} is declared twice")]
    DuplicateTask(TaskId),
    #[error("initially active screen {0} is not declared")]
    UnknownInitialScreen(ScreenId),
}

/// Editable description of the host markup, validated into a [`GameLayout`].
#[derive(Debug, Clone)]
pub struct GameLayoutDraft {
    pub screens: Vec<ScreenId>,
    pub initially_active: Option<ScreenId>,
    pub start_screen: ScreenId,
    pub map_screen: ScreenId,
    pub task_screen: ScreenId,
    pub tasks: Vec<TaskLayout>,
    pub shared_result: Option<PanelMarkup>,
    /// Task-selector items on the map, in display order.
    pub task_items: Vec<TaskId>,
    pub start_button: bool,
    pub back_button: bool,
}

impl GameLayoutDraft {
    /// # Errors
    ///
    /// Returns `LayoutError` for empty or duplicated declarations.
    pub fn validate(self) -> Result<GameLayout, LayoutError> {
        if self.screens.is_empty() {
            return Err(LayoutError::NoScreens);
        }
        let mut seen = HashSet::new();
        for screen in &self.screens {
            if !seen.insert(screen) {
                return Err(LayoutError::DuplicateScreen(screen.clone()));
            }
        }
        if let Some(initial) = &self.initially_active {
            if !seen.contains(initial) {
                return Err(LayoutError::UnknownInitialScreen(initial.clone()));
            }
        }
        let mut seen_tasks = HashSet::new();
        for task in &self.tasks {
            if !seen_tasks.insert(&task.id) {
                return Err(LayoutError::DuplicateTask(task.id.clone()));
            }
        }

        Ok(GameLayout { draft: self })
    }
}

/// Validated description of the screens, tasks and reward markup the host renders.
#[derive(Debug, Clone)]
pub struct GameLayout {
    draft: GameLayoutDraft,
}

/// Task ids of the stock content, in map order.
pub const STANDARD_TASKS: [&str; 8] = [
    "ai",
    "antifragility",
    "self-skills",
    "growth-mindset",
    "working-with-generations",
    "effective-feedback",
    "biohacking",
    "crisis-leadership",
];

impl GameLayout {
    /// The stock three-screen game with eight tasks, each owning a full reward panel.
    #[must_use]
    pub fn standard() -> Self {
        let tasks: Vec<TaskId> = STANDARD_TASKS
            .iter()
            .filter_map(|id| TaskId::new(*id).ok())
            .collect();
        Self {
            draft: GameLayoutDraft {
                screens: vec![ScreenId::start(), ScreenId::maps(), ScreenId::task()],
                initially_active: Some(ScreenId::start()),
                start_screen: ScreenId::start(),
                map_screen: ScreenId::maps(),
                task_screen: ScreenId::task(),
                tasks: tasks
                    .iter()
                    .map(|id| TaskLayout {
                        id: id.clone(),
                        result: Some(PanelMarkup::complete()),
                    })
                    .collect(),
                shared_result: None,
                task_items: tasks,
                start_button: true,
                back_button: true,
            },
        }
    }

    /// Editable copy of this layout.
    #[must_use]
    pub fn to_draft(&self) -> GameLayoutDraft {
        self.draft.clone()
    }

    #[must_use]
    pub fn screens(&self) -> &[ScreenId] {
        &self.draft.screens
    }

    #[must_use]
    pub fn has_screen(&self, id: &ScreenId) -> bool {
        self.draft.screens.contains(id)
    }

    #[must_use]
    pub fn initially_active(&self) -> Option<&ScreenId> {
        self.draft.initially_active.as_ref()
    }

    #[must_use]
    pub fn start_screen(&self) -> &ScreenId {
        &self.draft.start_screen
    }

    #[must_use]
    pub fn map_screen(&self) -> &ScreenId {
        &self.draft.map_screen
    }

    #[must_use]
    pub fn task_screen(&self) -> &ScreenId {
        &self.draft.task_screen
    }

    /// Tasks live inside the task screen; without it there are none.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskLayout> {
        let hosted = self.has_screen(&self.draft.task_screen);
        self.draft.tasks.iter().filter(move |_| hosted)
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&TaskLayout> {
        self.tasks().find(|task| &task.id == id)
    }

    #[must_use]
    pub fn shared_result(&self) -> Option<PanelMarkup> {
        self.draft.shared_result
    }

    #[must_use]
    pub fn task_items(&self) -> &[TaskId] {
        &self.draft.task_items
    }

    #[must_use]
    pub fn has_start_button(&self) -> bool {
        self.draft.start_button
    }

    #[must_use]
    pub fn has_back_button(&self) -> bool {
        self.draft.back_button
    }
}

impl Default for GameLayout {
    fn default() -> Self {
        Self::standard()
    }
}
