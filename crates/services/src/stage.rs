//! Visual state of every element the game controls.
//!
//! The host renders whatever the stage says; services only ever mutate the
//! stage, never the host directly.

use std::collections::HashMap;

use quest_core::model::{ScreenId, TaskId};

/// Reward panel identity: a task's own panel, or the task screen's shared one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PanelId {
    Own(TaskId),
    Shared,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Screen(ScreenId),
    Task(TaskId),
    TaskItem(TaskId),
    Collect(PanelId),
    Ready(PanelId),
    Title(PanelId),
    Segment(PanelId, u32),
}

impl ElementKey {
    /// The reward panel this element belongs to, if any.
    #[must_use]
    pub fn panel(&self) -> Option<&PanelId> {
        match self {
            ElementKey::Collect(panel)
            | ElementKey::Ready(panel)
            | ElementKey::Title(panel)
            | ElementKey::Segment(panel, _) => Some(panel),
            ElementKey::Screen(_) | ElementKey::Task(_) | ElementKey::TaskItem(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// `hidden` attribute: not rendered at all.
    pub hidden: bool,
    /// Member of an exclusive group currently selected.
    pub active: bool,
    /// Secondary marker, e.g. "collected" on a task item.
    pub marked: bool,
    pub opacity: f32,
    pub scale: f32,
}

impl Visual {
    #[must_use]
    pub fn shown() -> Self {
        Self {
            hidden: false,
            active: false,
            marked: false,
            opacity: 1.0,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::shown()
        }
    }

    /// Rendered and not fully transparent.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.opacity > 0.0
    }
}

/// Partial update of the animatable properties.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Props {
    pub opacity: Option<f32>,
    pub scale: Option<f32>,
}

impl Props {
    #[must_use]
    pub fn opacity(value: f32) -> Self {
        Self {
            opacity: Some(value),
            scale: None,
        }
    }

    #[must_use]
    pub fn faded(opacity: f32, scale: f32) -> Self {
        Self {
            opacity: Some(opacity),
            scale: Some(scale),
        }
    }

    #[must_use]
    pub fn opaque() -> Self {
        Self::faded(1.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct Stage {
    visuals: HashMap<ElementKey, Visual>,
    titles: HashMap<PanelId, String>,
    panel_hosts: HashMap<PanelId, TaskId>,
    scroll_resets: u64,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: ElementKey, visual: Visual) {
        self.visuals.insert(key, visual);
    }

    #[must_use]
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.visuals.contains_key(key)
    }

    #[must_use]
    pub fn visual(&self, key: &ElementKey) -> Option<Visual> {
        self.visuals.get(key).copied()
    }

    pub(crate) fn visual_mut(&mut self, key: &ElementKey) -> Option<&mut Visual> {
        self.visuals.get_mut(key)
    }

    /// Remove the `hidden` attribute.
    pub fn show(&mut self, key: &ElementKey) {
        if let Some(visual) = self.visuals.get_mut(key) {
            visual.hidden = false;
        }
    }

    pub fn hide(&mut self, key: &ElementKey) {
        if let Some(visual) = self.visuals.get_mut(key) {
            visual.hidden = true;
        }
    }

    pub fn set_active(&mut self, key: &ElementKey, active: bool) {
        if let Some(visual) = self.visuals.get_mut(key) {
            visual.active = active;
        }
    }

    pub fn set_marked(&mut self, key: &ElementKey, marked: bool) {
        if let Some(visual) = self.visuals.get_mut(key) {
            visual.marked = marked;
        }
    }

    /// Hidden and no longer active.
    pub fn conceal(&mut self, key: &ElementKey) {
        if let Some(visual) = self.visuals.get_mut(key) {
            visual.hidden = true;
            visual.active = false;
        }
    }

    pub fn apply(&mut self, key: &ElementKey, props: Props) {
        if let Some(visual) = self.visuals.get_mut(key) {
            if let Some(opacity) = props.opacity {
                visual.opacity = opacity;
            }
            if let Some(scale) = props.scale {
                visual.scale = scale;
            }
        }
    }

    /// Scroll the host viewport to the top. Hosts observe the counter.
    pub fn reset_scroll(&mut self) {
        self.scroll_resets += 1;
    }

    #[must_use]
    pub fn scroll_resets(&self) -> u64 {
        self.scroll_resets
    }

    pub fn set_title(&mut self, panel: &PanelId, text: String) {
        self.titles.insert(panel.clone(), text);
    }

    #[must_use]
    pub fn title(&self, panel: &PanelId) -> Option<&str> {
        self.titles.get(panel).map(String::as_str)
    }

    /// Move `panel` under `task`.
    pub fn attach_panel(&mut self, panel: &PanelId, task: &TaskId) {
        self.panel_hosts.insert(panel.clone(), task.clone());
    }

    #[must_use]
    pub fn panel_host(&self, panel: &PanelId) -> Option<&TaskId> {
        self.panel_hosts.get(panel)
    }
}
