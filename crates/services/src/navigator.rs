//! Screen registry and transition engine.
//!
//! Screens and the task sub-screens are two instances of the same machine: an
//! exclusive group where exactly one member is active, switched either by an
//! animated cross-fade or instantly.

use std::fmt;

use quest_core::FadeTiming;
use quest_core::model::{ScreenId, TaskId};
use tracing::{debug, warn};

use crate::error::NavigationError;
use crate::progress::ProgressSession;
use crate::scheduler::{Cue, Motion, MotionError, TweenId};
use crate::stage::{ElementKey, Props, Stage};

pub trait Member: Clone + PartialEq + fmt::Debug {
    fn key(&self) -> ElementKey;
}

impl Member for ScreenId {
    fn key(&self) -> ElementKey {
        ElementKey::Screen(self.clone())
    }
}

impl Member for TaskId {
    fn key(&self) -> ElementKey {
        ElementKey::Task(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPhase<M> {
    Idle,
    CrossFading {
        outgoing: Option<M>,
        incoming: M,
        tweens: Vec<TweenId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Target was already active; the group was only re-converged.
    AlreadyActive,
    Switched { animated: bool },
}

/// Mutually exclusive members sharing one visibility slot.
#[derive(Debug)]
pub struct ExclusiveGroup<M> {
    members: Vec<M>,
    phase: TransitionPhase<M>,
    fade_out: FadeTiming,
    fade_in: FadeTiming,
}

impl<M: Member> ExclusiveGroup<M> {
    #[must_use]
    pub fn new(members: Vec<M>, fade_out: FadeTiming, fade_in: FadeTiming) -> Self {
        Self {
            members,
            phase: TransitionPhase::Idle,
            fade_out,
            fade_in,
        }
    }

    #[must_use]
    pub fn members(&self) -> &[M] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, member: &M) -> bool {
        self.members.contains(member)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn phase(&self) -> &TransitionPhase<M> {
        &self.phase
    }

    #[must_use]
    pub fn active(&self, stage: &Stage) -> Option<M> {
        self.members
            .iter()
            .find(|member| stage.visual(&member.key()).is_some_and(|visual| visual.active))
            .cloned()
    }

    /// Make `target` the single active member.
    pub fn switch_to(&mut self, target: &M, stage: &mut Stage, motion: &mut Motion) -> SwitchOutcome {
        self.settle(stage, motion);
        let current = self.active(stage);

        if current.as_ref() == Some(target) {
            self.converge(target, stage);
            stage.reset_scroll();
            return SwitchOutcome::AlreadyActive;
        }

        if motion.is_animated() {
            match self.cross_fade(current.as_ref(), target, stage, motion) {
                Ok(tweens) => {
                    self.phase = TransitionPhase::CrossFading {
                        outgoing: current,
                        incoming: target.clone(),
                        tweens,
                    };
                    return SwitchOutcome::Switched { animated: true };
                }
                Err(err) => {
                    warn!(?target, error = %err, "cross-fade failed, switching instantly");
                }
            }
        }

        self.converge(target, stage);
        stage.reset_scroll();
        SwitchOutcome::Switched { animated: false }
    }

    /// Finish an in-flight cross-fade immediately.
    pub fn settle(&mut self, stage: &mut Stage, motion: &mut Motion) {
        let TransitionPhase::CrossFading { tweens, incoming, .. } =
            std::mem::replace(&mut self.phase, TransitionPhase::Idle)
        else {
            return;
        };
        let scheduler = motion.scheduler_mut();
        let mut settled = 0_usize;
        for id in tweens {
            if scheduler.is_running(id) {
                // Group tweens only carry `Conceal`, which the scheduler applies itself.
                let _ = scheduler.finish(id, stage);
                settled += 1;
            }
        }
        if settled > 0 {
            debug!(?incoming, settled, "settled in-flight transition");
        }
    }

    fn cross_fade(
        &self,
        current: Option<&M>,
        target: &M,
        stage: &mut Stage,
        motion: &mut Motion,
    ) -> Result<Vec<TweenId>, MotionError> {
        let target_key = target.key();
        stage.show(&target_key);
        stage.set_active(&target_key, true);
        let scheduler = motion.scheduler_mut();
        scheduler.set(stage, &target_key, Props::faded(0.0, 1.0))?;

        for member in &self.members {
            if member != target && Some(member) != current {
                stage.conceal(&member.key());
            }
        }

        let mut tweens = Vec::with_capacity(2);
        if let Some(current) = current {
            let key = current.key();
            stage.set_active(&key, false);
            match scheduler.animate(
                stage,
                &key,
                Props::opacity(0.0),
                self.fade_out,
                Some(Cue::Conceal(key.clone())),
            ) {
                Ok(id) => tweens.push(id),
                Err(err) => {
                    stage.conceal(&key);
                    return Err(err);
                }
            }
        }

        stage.reset_scroll();
        match scheduler.animate(stage, &target_key, Props::opacity(1.0), self.fade_in, None) {
            Ok(id) => tweens.push(id),
            Err(err) => {
                for id in tweens {
                    let _ = scheduler.finish(id, stage);
                }
                return Err(err);
            }
        }
        Ok(tweens)
    }

    fn converge(&self, target: &M, stage: &mut Stage) {
        for member in &self.members {
            if member != target {
                stage.conceal(&member.key());
            }
        }
        let key = target.key();
        stage.show(&key);
        stage.set_active(&key, true);
        stage.apply(&key, Props::opaque());
    }
}

/// What the caller still owes after a navigation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavOutcome {
    pub switch: SwitchOutcome,
    /// Reward panel to re-render now.
    pub render: Option<TaskId>,
}

#[derive(Debug)]
pub struct Navigator {
    screens: ExclusiveGroup<ScreenId>,
    tasks: ExclusiveGroup<TaskId>,
    task_screen: ScreenId,
}

impl Navigator {
    #[must_use]
    pub fn new(screens: ExclusiveGroup<ScreenId>, tasks: ExclusiveGroup<TaskId>, task_screen: ScreenId) -> Self {
        Self {
            screens,
            tasks,
            task_screen,
        }
    }

    #[must_use]
    pub fn screens(&self) -> &ExclusiveGroup<ScreenId> {
        &self.screens
    }

    #[must_use]
    pub fn tasks(&self) -> &ExclusiveGroup<TaskId> {
        &self.tasks
    }

    #[must_use]
    pub fn task_screen(&self) -> &ScreenId {
        &self.task_screen
    }

    /// # Errors
    ///
    /// Returns `NavigationError::UnknownScreen` without touching any state.
    pub fn show_screen(
        &mut self,
        id: &ScreenId,
        stage: &mut Stage,
        motion: &mut Motion,
        session: &mut ProgressSession,
    ) -> Result<NavOutcome, NavigationError> {
        if !self.screens.contains(id) {
            return Err(NavigationError::UnknownScreen(id.clone()));
        }

        let switch = self.screens.switch_to(id, stage, motion);
        if switch == SwitchOutcome::AlreadyActive {
            return Ok(NavOutcome { switch, render: None });
        }

        session.record_screen(id.clone());
        let render = if id == &self.task_screen {
            session.state().current_task_id().cloned()
        } else {
            None
        };
        Ok(NavOutcome { switch, render })
    }

    /// # Errors
    ///
    /// Returns `NavigationError::NoTasks` or `UnknownTask` without touching any state.
    pub fn show_task(
        &mut self,
        id: &TaskId,
        stage: &mut Stage,
        motion: &mut Motion,
        session: &mut ProgressSession,
    ) -> Result<NavOutcome, NavigationError> {
        if self.tasks.is_empty() {
            return Err(NavigationError::NoTasks);
        }
        if !self.tasks.contains(id) {
            return Err(NavigationError::UnknownTask(id.clone()));
        }

        let switch = self.tasks.switch_to(id, stage, motion);
        let recorded = session.state().current_task_id() == Some(id)
            && session.state().current_screen() == &self.task_screen;
        if !recorded {
            session.record_task(id.clone(), self.task_screen.clone());
        }
        Ok(NavOutcome {
            switch,
            render: Some(id.clone()),
        })
    }

    /// Whether either group is mid cross-fade.
    #[must_use]
    pub fn is_transitioning(&self, motion: &Motion) -> bool {
        phase_running(self.screens.phase(), motion) || phase_running(self.tasks.phase(), motion)
    }
}

fn phase_running<M>(phase: &TransitionPhase<M>, motion: &Motion) -> bool {
    match phase {
        TransitionPhase::CrossFading { tweens, .. } => tweens
            .iter()
            .any(|id| motion.scheduler().is_running(*id)),
        TransitionPhase::Idle => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use quest_core::{Easing, MotionMode};
    use storage::{InMemoryStore, ProgressStore};

    use super::*;
    use crate::scheduler::Scheduler;
    use crate::stage::Visual;

    fn ids(names: &[&str]) -> Vec<ScreenId> {
        names.iter().map(|name| ScreenId::new(*name).unwrap()).collect()
    }

    fn stage_with(screens: &[ScreenId], active: &ScreenId) -> Stage {
        let mut stage = Stage::new();
        for screen in screens {
            let visual = if screen == active {
                Visual { active: true, ..Visual::shown() }
            } else {
                Visual::hidden()
            };
            stage.register(screen.key(), visual);
        }
        stage
    }

    fn group(screens: Vec<ScreenId>) -> ExclusiveGroup<ScreenId> {
        ExclusiveGroup::new(
            screens,
            FadeTiming::new(300, Easing::Power1Out),
            FadeTiming::new(350, Easing::Power2Out),
        )
    }

    fn count_active(stage: &Stage, screens: &[ScreenId]) -> usize {
        screens
            .iter()
            .filter(|id| stage.visual(&id.key()).unwrap().active)
            .count()
    }

    fn count_shown(stage: &Stage, screens: &[ScreenId]) -> usize {
        screens
            .iter()
            .filter(|id| !stage.visual(&id.key()).unwrap().hidden)
            .count()
    }

    #[test]
    fn animated_switch_keeps_one_active_and_hides_outgoing_later() {
        let screens = ids(&["start", "maps", "task"]);
        let mut stage = stage_with(&screens, &screens[0]);
        let mut motion = Motion::new(MotionMode::Animated);
        let mut group = group(screens.clone());

        let outcome = group.switch_to(&screens[1], &mut stage, &mut motion);
        assert_eq!(outcome, SwitchOutcome::Switched { animated: true });
        assert_eq!(count_active(&stage, &screens), 1);
        assert_eq!(count_shown(&stage, &screens), 2);
        assert_eq!(stage.scroll_resets(), 1);

        motion.scheduler_mut().advance(Duration::from_millis(400), &mut stage);
        assert_eq!(count_shown(&stage, &screens), 1);
        assert_eq!(group.active(&stage), Some(screens[1].clone()));
        assert!((stage.visual(&screens[1].key()).unwrap().opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn repeated_switch_does_not_animate_again() {
        let screens = ids(&["start", "maps"]);
        let mut stage = stage_with(&screens, &screens[0]);
        let mut motion = Motion::new(MotionMode::Animated);
        let mut group = group(screens.clone());

        group.switch_to(&screens[1], &mut stage, &mut motion);
        motion.scheduler_mut().advance(Duration::from_secs(1), &mut stage);
        assert!(motion.scheduler().is_idle());

        let outcome = group.switch_to(&screens[1], &mut stage, &mut motion);
        assert_eq!(outcome, SwitchOutcome::AlreadyActive);
        assert!(motion.scheduler().is_idle());
        assert_eq!(count_shown(&stage, &screens), 1);
    }

    #[test]
    fn second_switch_mid_fade_settles_the_first() {
        let screens = ids(&["start", "maps", "task"]);
        let mut stage = stage_with(&screens, &screens[0]);
        let mut motion = Motion::new(MotionMode::Animated);
        let mut group = group(screens.clone());

        group.switch_to(&screens[1], &mut stage, &mut motion);
        motion.scheduler_mut().advance(Duration::from_millis(100), &mut stage);
        group.switch_to(&screens[2], &mut stage, &mut motion);

        assert!(stage.visual(&screens[0].key()).unwrap().hidden);
        assert_eq!(count_active(&stage, &screens), 1);
        assert_eq!(count_shown(&stage, &screens), 2);

        motion.scheduler_mut().advance(Duration::from_secs(1), &mut stage);
        assert_eq!(count_shown(&stage, &screens), 1);
        assert_eq!(group.active(&stage), Some(screens[2].clone()));
    }

    #[test]
    fn failed_animation_falls_back_to_instant() {
        let screens = ids(&["start", "maps"]);
        let mut stage = stage_with(&screens, &screens[0]);
        let mut motion = Motion::with_scheduler(MotionMode::Animated, Scheduler::with_tween_limit(1));
        let mut group = group(screens.clone());

        let outcome = group.switch_to(&screens[1], &mut stage, &mut motion);
        assert_eq!(outcome, SwitchOutcome::Switched { animated: false });
        assert!(motion.scheduler().is_idle());
        assert_eq!(count_shown(&stage, &screens), 1);
        assert_eq!(count_active(&stage, &screens), 1);
        assert!((stage.visual(&screens[1].key()).unwrap().opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_screen_changes_nothing() {
        let screens = ids(&["start", "maps"]);
        let mut stage = stage_with(&screens, &screens[0]);
        let mut motion = Motion::new(MotionMode::Instant);
        let backend = InMemoryStore::new();
        let mut session = ProgressSession::load(ProgressStore::new(
            Arc::new(backend.clone()),
            ScreenId::start(),
        ));
        let tasks = ExclusiveGroup::new(
            Vec::new(),
            FadeTiming::new(250, Easing::Power1Out),
            FadeTiming::new(300, Easing::Power2Out),
        );
        let mut navigator = Navigator::new(group(screens.clone()), tasks, ScreenId::task());

        let missing = ScreenId::new("nonexistent").unwrap();
        let err = navigator
            .show_screen(&missing, &mut stage, &mut motion, &mut session)
            .unwrap_err();
        assert_eq!(err, NavigationError::UnknownScreen(missing));
        assert_eq!(stage.scroll_resets(), 0);
        assert!(backend.is_empty());

        let err = navigator
            .show_task(&TaskId::new("ai").unwrap(), &mut stage, &mut motion, &mut session)
            .unwrap_err();
        assert_eq!(err, NavigationError::NoTasks);
    }
}
