use quest_core::model::{ScreenId, TaskId};
use services::{ElementKey, Game, PanelId, Stage, Target, Visual};

/// Render-ready state of one stage element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementVm {
    pub hidden: bool,
    pub active: bool,
    pub marked: bool,
    pub style: String,
}

impl ElementVm {
    fn from_visual(visual: Visual) -> Self {
        Self {
            hidden: visual.hidden,
            active: visual.active,
            marked: visual.marked,
            style: format!("opacity: {:.3}; transform: scale({:.3});", visual.opacity, visual.scale),
        }
    }

    fn lookup(stage: &Stage, key: &ElementKey) -> Option<Self> {
        stage.visual(key).map(Self::from_visual)
    }

    #[must_use]
    pub fn class(&self, base: &str) -> String {
        let mut class = base.to_owned();
        if self.active {
            class.push_str(" is-active");
        }
        if self.marked {
            class.push_str(" is-collected");
        }
        class
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelVm {
    pub panel: PanelId,
    pub collect: Option<ElementVm>,
    pub collect_target: Target,
    pub ready: Option<ElementVm>,
    pub title: Option<(String, ElementVm)>,
    pub segments: Vec<ElementVm>,
    pub back: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskVm {
    pub id: TaskId,
    pub label: String,
    pub element: ElementVm,
    pub panel: Option<PanelVm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskItemVm {
    pub id: TaskId,
    pub number: usize,
    pub label: String,
    pub element: ElementVm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenRole {
    Start,
    Map,
    Task,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScreenVm {
    pub id: ScreenId,
    pub role: ScreenRole,
    pub element: ElementVm,
}

/// Everything the game view needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GameVm {
    pub screens: Vec<ScreenVm>,
    pub tasks: Vec<TaskVm>,
    pub items: Vec<TaskItemVm>,
    pub start_button: bool,
    pub back_button: bool,
    pub completed: u32,
}

impl GameVm {
    #[must_use]
    pub fn from_game(game: &Game) -> Self {
        let layout = game.layout();
        let stage = game.stage();

        let screens = layout
            .screens()
            .iter()
            .filter_map(|id| {
                let role = if id == layout.start_screen() {
                    ScreenRole::Start
                } else if id == layout.map_screen() {
                    ScreenRole::Map
                } else if id == layout.task_screen() {
                    ScreenRole::Task
                } else {
                    ScreenRole::Other
                };
                Some(ScreenVm {
                    id: id.clone(),
                    role,
                    element: ElementVm::lookup(stage, &ElementKey::Screen(id.clone()))?,
                })
            })
            .collect();

        let tasks = layout
            .tasks()
            .filter_map(|task| {
                let element = ElementVm::lookup(stage, &ElementKey::Task(task.id.clone()))?;
                Some(TaskVm {
                    id: task.id.clone(),
                    label: task_label(&task.id),
                    element,
                    panel: panel_vm(game, &task.id),
                })
            })
            .collect();

        let items = layout
            .task_items()
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                Some(TaskItemVm {
                    id: id.clone(),
                    number: index + 1,
                    label: task_label(id),
                    element: ElementVm::lookup(stage, &ElementKey::TaskItem(id.clone()))?,
                })
            })
            .collect();

        Self {
            screens,
            tasks,
            items,
            start_button: game.activation().is_bound(&Target::StartButton),
            back_button: game.activation().is_bound(&Target::BackButton),
            completed: game.completed_count(),
        }
    }
}

/// The panel shown inside `task`, if it is the panel's current host.
fn panel_vm(game: &Game, task: &TaskId) -> Option<PanelVm> {
    let panel = game.panel_of(task)?;
    let stage = game.stage();
    if stage.panel_host(&panel) != Some(task) {
        return None;
    }
    let markup = game.panel_markup(&panel)?;

    let title = stage.title(&panel).and_then(|text| {
        let element = ElementVm::lookup(stage, &ElementKey::Title(panel.clone()))?;
        Some((format!("Superpower {text} is yours!"), element))
    });
    let segments = (1..=markup.segments)
        .filter_map(|index| ElementVm::lookup(stage, &ElementKey::Segment(panel.clone(), index)))
        .collect();

    Some(PanelVm {
        collect: ElementVm::lookup(stage, &ElementKey::Collect(panel.clone())),
        collect_target: game.collect_target(&panel),
        ready: ElementVm::lookup(stage, &ElementKey::Ready(panel.clone())),
        title,
        segments,
        back: game.activation().is_bound(&Target::ResultBack(panel.clone())),
        panel,
    })
}

/// `"growth-mindset"` → `"Growth mindset"`.
#[must_use]
pub fn task_label(id: &TaskId) -> String {
    let words = id.as_str().replace(['-', '_'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
