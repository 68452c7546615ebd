//! Reward panels: the collect → ready swap and the segmented progress indicator.

use std::collections::HashMap;

use quest_core::MotionTimings;
use quest_core::model::{MAX_POINTS, PanelMarkup, TaskId, displayed_points, format_title};
use tracing::{debug, warn};

use crate::activation::{ActivationRegistry, BindOptions};
use crate::error::RewardError;
use crate::intent::{Action, Target};
use crate::progress::{ProgressSession, ProgressTracker};
use crate::scheduler::{Cue, Motion, MotionError};
use crate::stage::{ElementKey, PanelId, Props, Stage};

const SEGMENT_ON: f32 = 1.0;
const SEGMENT_OFF: f32 = 0.2;

/// A collect activation, tied to the panel rendering that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub task: TaskId,
    pub panel: PanelId,
    pub generation: u32,
}

#[derive(Debug)]
pub struct RewardSequencer {
    tasks: Vec<TaskId>,
    own: HashMap<TaskId, PanelMarkup>,
    shared: Option<PanelMarkup>,
    generations: HashMap<PanelId, u32>,
    timings: MotionTimings,
}

impl RewardSequencer {
    #[must_use]
    pub fn new(
        tasks: Vec<TaskId>,
        own: HashMap<TaskId, PanelMarkup>,
        shared: Option<PanelMarkup>,
        timings: MotionTimings,
    ) -> Self {
        Self {
            tasks,
            own,
            shared,
            generations: HashMap::new(),
            timings,
        }
    }

    #[must_use]
    pub fn markup(&self, panel: &PanelId) -> Option<PanelMarkup> {
        match panel {
            PanelId::Own(task) => self.own.get(task).copied(),
            PanelId::Shared => self.shared,
        }
    }

    /// Current rendering of `panel`; `0` before the first render.
    #[must_use]
    pub fn generation(&self, panel: &PanelId) -> u32 {
        self.generations.get(panel).copied().unwrap_or(0)
    }

    /// The panel `task` renders into, attaching the shared panel if needed.
    ///
    /// # Errors
    ///
    /// Returns `RewardError` if the task is unknown or has no container.
    pub fn resolve(&self, task: &TaskId, stage: &mut Stage) -> Result<(PanelId, PanelMarkup), RewardError> {
        if !self.tasks.contains(task) {
            return Err(RewardError::MissingTask(task.clone()));
        }
        if let Some(markup) = self.own.get(task) {
            return Ok((PanelId::Own(task.clone()), *markup));
        }
        let Some(markup) = self.shared else {
            return Err(RewardError::MissingResultContainer(task.clone()));
        };
        if stage.panel_host(&PanelId::Shared) != Some(task) {
            debug!(%task, "attaching shared result panel");
            stage.attach_panel(&PanelId::Shared, task);
        }
        Ok((PanelId::Shared, markup))
    }

    /// Re-render `task`'s panel from the current progress.
    ///
    /// # Errors
    ///
    /// Returns `RewardError` for missing markup; nothing is changed in that case.
    pub fn render(
        &mut self,
        task: &TaskId,
        stage: &mut Stage,
        motion: &mut Motion,
        session: &ProgressSession,
        activation: &mut ActivationRegistry<Target, Action>,
    ) -> Result<PanelId, RewardError> {
        let (panel, markup) = self.resolve(task, stage)?;
        if !markup.collect || !markup.ready {
            return Err(RewardError::MissingAffordance(panel));
        }

        if markup.back_button {
            activation.bind(
                Target::ResultBack(panel.clone()),
                Action::Back,
                BindOptions::default(),
            );
        }

        // A fresh collect node per render, so handlers never pile up.
        let previous = self.generation(&panel);
        let generation = previous + 1;
        self.generations.insert(panel.clone(), generation);
        activation.unbind(&Target::Collect {
            panel: panel.clone(),
            generation: previous,
        });
        activation.bind(
            Target::Collect {
                panel: panel.clone(),
                generation,
            },
            Action::Award {
                task: task.clone(),
                panel: panel.clone(),
                generation,
            },
            BindOptions::once(),
        );

        // Whatever an earlier rendering still had in flight belongs to the old node.
        let dropped = motion.scheduler_mut().cancel_panel(&panel);
        if dropped > 0 {
            debug!(?panel, dropped, "cancelled in-flight reward motion");
        }
        if markup.title {
            stage.apply(&ElementKey::Title(panel.clone()), Props::opaque());
        }

        let collect = ElementKey::Collect(panel.clone());
        let ready = ElementKey::Ready(panel.clone());
        let (shown, hidden) = if session.state().is_completed(task) {
            (ready, collect)
        } else {
            (collect, ready)
        };
        stage.hide(&hidden);
        stage.show(&shown);
        stage.apply(&shown, Props::opaque());

        paint(&panel, markup, session.state().completed_count(), stage);
        Ok(panel)
    }

    /// Collect the reward behind `claim`.
    pub fn award(
        &mut self,
        claim: &Claim,
        stage: &mut Stage,
        motion: &mut Motion,
        session: &mut ProgressSession,
        tracker: &ProgressTracker,
    ) {
        let Some(markup) = self.markup(&claim.panel) else {
            warn!(panel = ?claim.panel, "award on a panel without markup");
            return;
        };

        let was_completed = session.state().is_completed(&claim.task);
        let prev_count = session.state().completed_count();
        if !was_completed {
            tracker.mark_completed(&claim.task, session, stage);
        }
        let new_count = session.state().completed_count();
        let unlocked = displayed_points(new_count);
        let newly_unlocked = !was_completed && unlocked > prev_count;
        debug!(task = %claim.task, prev_count, new_count, newly_unlocked, "reward collected");

        let panel = &claim.panel;
        let collect = ElementKey::Collect(panel.clone());
        let ready = ElementKey::Ready(panel.clone());

        if !motion.is_animated() {
            stage.show(&ready);
            stage.apply(&ready, Props::opaque());
            paint(panel, markup, prev_count, stage);
            stage.hide(&collect);
            motion
                .scheduler_mut()
                .delay(self.timings.reward_delay, Cue::SettleIndicator { panel: panel.clone() });
            return;
        }

        paint(panel, markup, prev_count, stage);
        let scheduler = motion.scheduler_mut();
        // The ready affordance stays hidden until the collect one has faded out.
        if let Err(err) = scheduler.set(stage, &ready, Props::faded(0.0, 0.7)) {
            debug!(error = %err, "could not pre-stage ready affordance");
        }
        let faded = scheduler.animate(
            stage,
            &collect,
            Props::faded(0.0, 0.7),
            self.timings.collect_out,
            Some(Cue::RevealReady {
                panel: panel.clone(),
                generation: claim.generation,
            }),
        );
        if let Err(err) = faded {
            warn!(error = %err, "collect fade failed, swapping instantly");
            stage.hide(&collect);
            stage.show(&ready);
            stage.apply(&ready, Props::opaque());
        }

        if newly_unlocked {
            scheduler.delay(
                self.timings.reward_delay,
                Cue::Highlight {
                    panel: panel.clone(),
                    generation: claim.generation,
                    segment: unlocked,
                    count: new_count,
                },
            );
        } else {
            paint(panel, markup, new_count, stage);
        }
    }

    /// Continue a reward sequence when one of its cues comes due.
    pub fn on_cue(&mut self, cue: Cue, stage: &mut Stage, motion: &mut Motion, session: &ProgressSession) {
        match cue {
            Cue::RevealReady { panel, generation } => {
                if self.is_stale(&panel, generation) {
                    debug!(?panel, generation, "skipping reveal for a re-rendered panel");
                    return;
                }
                let collect = ElementKey::Collect(panel.clone());
                let ready = ElementKey::Ready(panel);
                stage.hide(&collect);
                stage.show(&ready);
                if let Err(err) = motion.scheduler_mut().animate(
                    stage,
                    &ready,
                    Props::opaque(),
                    self.timings.ready_in,
                    None,
                ) {
                    warn!(error = %err, "ready fade failed");
                    stage.apply(&ready, Props::opaque());
                }
            }
            Cue::Highlight {
                panel,
                generation,
                segment,
                count,
            } => {
                if self.is_stale(&panel, generation) {
                    debug!(?panel, generation, "skipping highlight for a re-rendered panel");
                    return;
                }
                let Some(markup) = self.markup(&panel) else {
                    return;
                };
                if markup.title {
                    stage.set_title(&panel, format_title(count));
                }
                if !markup.has_segment(segment) {
                    paint(&panel, markup, session.state().completed_count(), stage);
                    return;
                }
                if let Err(err) = self.highlight(&panel, markup, segment, stage, motion) {
                    warn!(error = %err, "highlight failed, showing final state");
                    stage.apply(&ElementKey::Title(panel.clone()), Props::opaque());
                    stage.apply(&ElementKey::Segment(panel.clone(), segment), Props::opacity(SEGMENT_ON));
                    paint(&panel, markup, session.state().completed_count(), stage);
                }
            }
            Cue::SettleIndicator { panel } => {
                if let Some(markup) = self.markup(&panel) {
                    paint(&panel, markup, session.state().completed_count(), stage);
                }
            }
            Cue::Conceal(key) => stage.conceal(&key),
        }
    }

    fn highlight(
        &self,
        panel: &PanelId,
        markup: PanelMarkup,
        segment: u32,
        stage: &mut Stage,
        motion: &mut Motion,
    ) -> Result<(), MotionError> {
        let scheduler = motion.scheduler_mut();
        if markup.title {
            let title = ElementKey::Title(panel.clone());
            scheduler.set(stage, &title, Props::faded(0.6, 0.95))?;
            scheduler.animate(stage, &title, Props::opaque(), self.timings.highlight, None)?;
        }
        let key = ElementKey::Segment(panel.clone(), segment);
        scheduler.set(stage, &key, Props::opacity(SEGMENT_OFF))?;
        scheduler.animate(
            stage,
            &key,
            Props::opacity(SEGMENT_ON),
            self.timings.highlight,
            Some(Cue::SettleIndicator { panel: panel.clone() }),
        )?;
        Ok(())
    }

    fn is_stale(&self, panel: &PanelId, generation: u32) -> bool {
        self.generation(panel) != generation
    }
}

/// Title and segments at `count`.
fn paint(panel: &PanelId, markup: PanelMarkup, count: u32, stage: &mut Stage) {
    if markup.title {
        stage.set_title(panel, format_title(count));
    }
    for index in 1..=MAX_POINTS {
        if markup.has_segment(index) {
            let opacity = if index <= count { SEGMENT_ON } else { SEGMENT_OFF };
            stage.apply(&ElementKey::Segment(panel.clone(), index), Props::opacity(opacity));
        }
    }
}
