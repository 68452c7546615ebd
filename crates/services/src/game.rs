//! The game controller: wires stage, motion, progress, navigation and rewards
//! together and turns activations into state changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quest_core::MotionMode;
use quest_core::model::{GameLayout, MAX_POINTS, PanelMarkup, ProgressState, ScreenId, TaskId};
use storage::{KeyValueStore, ProgressStore};
use tracing::{debug, error, info};

use crate::activation::{ActivationRegistry, BindOptions, InputEvent};
use crate::config::GameConfig;
use crate::error::{NavigationError, RewardError};
use crate::intent::{Action, Target};
use crate::navigator::{ExclusiveGroup, Member, NavOutcome, Navigator};
use crate::progress::{ProgressSession, ProgressTracker};
use crate::reward::{Claim, RewardSequencer};
use crate::scheduler::{Motion, Scheduler};
use crate::stage::{ElementKey, PanelId, Stage, Visual};

pub struct Game {
    layout: GameLayout,
    stage: Stage,
    motion: Motion,
    session: ProgressSession,
    activation: ActivationRegistry<Target, Action>,
    navigator: Navigator,
    tracker: ProgressTracker,
    rewards: RewardSequencer,
}

impl Game {
    /// Load progress from `store` and put every element of `layout` on stage.
    /// Call [`Game::boot`] before handing the game to a host.
    #[must_use]
    pub fn new(config: &GameConfig, layout: GameLayout, store: Arc<dyn KeyValueStore>) -> Self {
        let progress = ProgressStore::new(store, layout.start_screen().clone())
            .with_key(config.storage_key.clone());
        let session = ProgressSession::load(progress);

        let scheduler = match config.tween_limit {
            Some(limit) => Scheduler::with_tween_limit(limit),
            None => Scheduler::new(),
        };
        let motion = Motion::with_scheduler(config.motion, scheduler);

        let timings = config.timings;
        let tasks: Vec<TaskId> = layout.tasks().map(|task| task.id.clone()).collect();
        let navigator = Navigator::new(
            ExclusiveGroup::new(layout.screens().to_vec(), timings.screen_out, timings.screen_in),
            ExclusiveGroup::new(tasks.clone(), timings.task_out, timings.task_in),
            layout.task_screen().clone(),
        );
        let own: HashMap<TaskId, PanelMarkup> = layout
            .tasks()
            .filter_map(|task| task.result.map(|markup| (task.id.clone(), markup)))
            .collect();
        let rewards = RewardSequencer::new(tasks, own, layout.shared_result(), timings);

        let stage = build_stage(&layout);

        Self {
            layout,
            stage,
            motion,
            session,
            activation: ActivationRegistry::new(),
            navigator,
            tracker: ProgressTracker::new(),
            rewards,
        }
    }

    /// Wire task items and buttons, then restore the last location.
    pub fn boot(&mut self) {
        self.init_task_items();
        self.show_initial_screen();
        if self.layout.has_start_button() {
            self.activation
                .bind(Target::StartButton, Action::Start, BindOptions::default());
        }
        if self.layout.has_back_button() {
            self.activation
                .bind(Target::BackButton, Action::Back, BindOptions::default());
        }
        info!(
            mode = ?self.motion.mode(),
            completed = self.completed_count(),
            "game ready"
        );
    }

    fn init_task_items(&mut self) {
        if self.layout.task_items().is_empty() {
            error!("no task-selector items declared");
            return;
        }
        for task in self.layout.task_items().to_vec() {
            self.tracker
                .register_item(task.clone(), &self.session, &mut self.stage);
            self.activation.bind(
                Target::TaskItem(task.clone()),
                Action::OpenTask(task),
                BindOptions::default(),
            );
        }
        self.tracker.sync_items(&self.session, &mut self.stage);
    }

    fn show_initial_screen(&mut self) {
        let persisted = self.session.state().current_screen().clone();
        if self.layout.has_screen(&persisted) {
            let _ = self.show_screen(&persisted);
            if &persisted == self.layout.task_screen() {
                if let Some(task) = self.session.state().current_task_id().cloned() {
                    if self.show_task(&task).is_ok() {
                        self.tracker.set_active_item(&task, &mut self.stage);
                    }
                }
            }
            return;
        }

        debug!(screen = %persisted, "persisted screen is not registered");
        let start = self.layout.start_screen();
        let fallback = self
            .layout
            .initially_active()
            .or_else(|| self.layout.has_screen(start).then_some(start))
            .or_else(|| self.layout.screens().first())
            .cloned();
        if let Some(screen) = fallback {
            let _ = self.show_screen(&screen);
        }
    }

    /// Switch to screen `id`. Unknown ids are logged and change nothing.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::UnknownScreen` if `id` is not registered.
    pub fn show_screen(&mut self, id: &ScreenId) -> Result<(), NavigationError> {
        let outcome = self
            .navigator
            .show_screen(id, &mut self.stage, &mut self.motion, &mut self.session)
            .inspect_err(|err| error!(error = %err, "show_screen failed"))?;
        self.finish_navigation(outcome);
        Ok(())
    }

    /// Switch the task screen's content to task `id`.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if there are no tasks or `id` is unknown.
    pub fn show_task(&mut self, id: &TaskId) -> Result<(), NavigationError> {
        let outcome = self
            .navigator
            .show_task(id, &mut self.stage, &mut self.motion, &mut self.session)
            .inspect_err(|err| error!(error = %err, "show_task failed"))?;
        self.finish_navigation(outcome);
        Ok(())
    }

    /// What a task-selector item does: task screen, task, selected item.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if the task screen or the task is missing.
    pub fn open_task(&mut self, id: &TaskId) -> Result<(), NavigationError> {
        let task_screen = self.layout.task_screen().clone();
        self.show_screen(&task_screen)?;
        self.show_task(id)?;
        self.tracker.set_active_item(id, &mut self.stage);
        Ok(())
    }

    fn finish_navigation(&mut self, outcome: NavOutcome) {
        if let Some(task) = outcome.render {
            let _ = self.render_reward(&task);
        }
    }

    /// Re-render `task`'s reward panel from current progress.
    ///
    /// # Errors
    ///
    /// Returns `RewardError` (also logged) when the panel markup is missing.
    pub fn render_reward(&mut self, task: &TaskId) -> Result<PanelId, RewardError> {
        self.rewards
            .render(task, &mut self.stage, &mut self.motion, &self.session, &mut self.activation)
            .inspect_err(|err| error!(error = %err, "reward panel not rendered"))
    }

    /// Collect `task`'s reward through whichever panel it renders into.
    ///
    /// # Errors
    ///
    /// Returns `RewardError` if the task has no panel.
    pub fn award(&mut self, task: &TaskId) -> Result<(), RewardError> {
        let (panel, _) = self.rewards.resolve(task, &mut self.stage)?;
        let claim = Claim {
            task: task.clone(),
            generation: self.rewards.generation(&panel),
            panel,
        };
        self.collect(&claim);
        Ok(())
    }

    fn collect(&mut self, claim: &Claim) {
        self.rewards.award(
            claim,
            &mut self.stage,
            &mut self.motion,
            &mut self.session,
            &self.tracker,
        );
    }

    /// Route a host input event. `true` means the event was consumed and its
    /// default action must be suppressed.
    pub fn dispatch(&mut self, target: &Target, event: &InputEvent) -> bool {
        let Some(action) = self.activation.dispatch(target, event) else {
            return false;
        };
        debug!(?target, ?action, "activation");
        self.perform(action);
        true
    }

    /// Shorthand for a click on `target`.
    pub fn activate(&mut self, target: &Target) -> bool {
        self.dispatch(target, &InputEvent::Click)
    }

    fn perform(&mut self, action: Action) {
        // Failures below are logged where they happen.
        match action {
            Action::Start | Action::Back => {
                let map = self.layout.map_screen().clone();
                let _ = self.show_screen(&map);
            }
            Action::OpenTask(task) => {
                let _ = self.open_task(&task);
            }
            Action::Award {
                task,
                panel,
                generation,
            } => self.collect(&Claim {
                task,
                panel,
                generation,
            }),
        }
    }

    /// Advance virtual time and run whatever came due.
    pub fn tick(&mut self, dt: Duration) {
        let cues = self.motion.scheduler_mut().advance(dt, &mut self.stage);
        for cue in cues {
            self.rewards
                .on_cue(cue, &mut self.stage, &mut self.motion, &self.session);
        }
    }

    /// Anything still scheduled: tweens, highlights or delayed updates.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.motion.scheduler().is_idle()
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.navigator.is_transitioning(&self.motion)
    }

    #[must_use]
    pub fn completed_count(&self) -> u32 {
        self.tracker.completed_count(&self.session)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressState {
        self.session.state()
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    #[must_use]
    pub fn motion_mode(&self) -> MotionMode {
        self.motion.mode()
    }

    #[must_use]
    pub fn activation(&self) -> &ActivationRegistry<Target, Action> {
        &self.activation
    }

    #[must_use]
    pub fn active_screen(&self) -> Option<ScreenId> {
        self.navigator.screens().active(&self.stage)
    }

    #[must_use]
    pub fn active_task(&self) -> Option<TaskId> {
        self.navigator.tasks().active(&self.stage)
    }

    /// The panel `task` renders into, without attaching anything.
    #[must_use]
    pub fn panel_of(&self, task: &TaskId) -> Option<PanelId> {
        let layout = self.layout.task(task)?;
        match layout.result {
            Some(_) => Some(PanelId::Own(task.clone())),
            None => self.layout.shared_result().map(|_| PanelId::Shared),
        }
    }

    #[must_use]
    pub fn panel_markup(&self, panel: &PanelId) -> Option<PanelMarkup> {
        self.rewards.markup(panel)
    }

    /// The collect target of `panel`'s current rendering.
    #[must_use]
    pub fn collect_target(&self, panel: &PanelId) -> Target {
        Target::Collect {
            panel: panel.clone(),
            generation: self.rewards.generation(panel),
        }
    }
}

fn build_stage(layout: &GameLayout) -> Stage {
    let mut stage = Stage::new();
    let initial = layout.initially_active();
    for screen in layout.screens() {
        let visual = if Some(screen) == initial {
            Visual {
                active: true,
                ..Visual::shown()
            }
        } else {
            Visual::hidden()
        };
        stage.register(screen.key(), visual);
    }

    for task in layout.tasks() {
        stage.register(task.id.key(), Visual::hidden());
        if let Some(markup) = task.result {
            let panel = PanelId::Own(task.id.clone());
            register_panel(&mut stage, &panel, markup);
            stage.attach_panel(&panel, &task.id);
        }
    }
    if let Some(markup) = layout.shared_result() {
        register_panel(&mut stage, &PanelId::Shared, markup);
    }
    stage
}

fn register_panel(stage: &mut Stage, panel: &PanelId, markup: PanelMarkup) {
    if markup.collect {
        stage.register(ElementKey::Collect(panel.clone()), Visual::shown());
    }
    if markup.ready {
        stage.register(ElementKey::Ready(panel.clone()), Visual::hidden());
    }
    if markup.title {
        stage.register(ElementKey::Title(panel.clone()), Visual::shown());
    }
    for index in 1..=MAX_POINTS {
        if markup.has_segment(index) {
            stage.register(ElementKey::Segment(panel.clone(), index), Visual::shown());
        }
    }
}

#[cfg(test)]
mod tests {
    use quest_core::model::GameLayoutDraft;
    use storage::InMemoryStore;

    use super::*;

    fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    fn instant_game(layout: GameLayout) -> Game {
        let mut game = Game::new(
            &GameConfig::new(MotionMode::Instant),
            layout,
            Arc::new(InMemoryStore::new()),
        );
        game.boot();
        game
    }

    fn shared_panel_layout() -> GameLayout {
        let mut draft: GameLayoutDraft = GameLayout::standard().to_draft();
        for task in &mut draft.tasks {
            if task.id.as_str() != "ai" {
                task.result = None;
            }
        }
        draft.shared_result = Some(PanelMarkup::complete());
        draft.validate().unwrap()
    }

    #[test]
    fn boot_lands_on_initially_active_screen() {
        let game = instant_game(GameLayout::standard());
        assert_eq!(game.active_screen(), Some(ScreenId::start()));
        assert!(game.activation().is_bound(&Target::StartButton));
        assert!(game.activation().is_bound(&Target::TaskItem(task("ai"))));
    }

    #[test]
    fn shared_panel_follows_the_rendered_task() {
        let mut game = instant_game(shared_panel_layout());
        assert_eq!(game.panel_of(&task("ai")), Some(PanelId::Own(task("ai"))));
        assert_eq!(game.panel_of(&task("biohacking")), Some(PanelId::Shared));

        game.open_task(&task("biohacking")).unwrap();
        assert_eq!(game.stage().panel_host(&PanelId::Shared), Some(&task("biohacking")));
        game.open_task(&task("antifragility")).unwrap();
        assert_eq!(game.stage().panel_host(&PanelId::Shared), Some(&task("antifragility")));
    }

    #[test]
    fn task_without_any_panel_is_a_reward_error() {
        let mut draft = GameLayout::standard().to_draft();
        draft.tasks[0].result = None;
        let mut game = instant_game(draft.validate().unwrap());

        let err = game.render_reward(&task("ai")).unwrap_err();
        assert_eq!(err, RewardError::MissingResultContainer(task("ai")));
        assert_eq!(game.completed_count(), 0);
    }

    #[test]
    fn panel_without_collect_affordance_is_rejected() {
        let mut draft = GameLayout::standard().to_draft();
        draft.tasks[0].result = Some(PanelMarkup {
            collect: false,
            ..PanelMarkup::complete()
        });
        let mut game = instant_game(draft.validate().unwrap());

        let err = game.render_reward(&task("ai")).unwrap_err();
        assert_eq!(err, RewardError::MissingAffordance(PanelId::Own(task("ai"))));
    }

    #[test]
    fn every_render_replaces_the_collect_target() {
        let mut game = instant_game(GameLayout::standard());
        let panel = PanelId::Own(task("ai"));
        game.open_task(&task("ai")).unwrap();
        let first = game.collect_target(&panel);
        game.render_reward(&task("ai")).unwrap();
        let second = game.collect_target(&panel);

        assert_ne!(first, second);
        assert!(!game.activation().is_bound(&first));
        assert!(game.activation().is_live(&second));
    }
}
