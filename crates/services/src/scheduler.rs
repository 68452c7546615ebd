//! Virtual-time scheduler: opacity/scale tweens, delayed cues and the motion
//! capability built on top of them.
//!
//! Nothing here blocks. The host advances time (one call per frame) and gets
//! back the cues that came due, in the order they came due.

use std::time::Duration;

use quest_core::{FadeTiming, MotionMode};
use thiserror::Error;

use crate::stage::{ElementKey, PanelId, Props, Stage};

/// Continuation fired when a tween completes or a timer comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Hide the element and drop its active mark. Applied by the scheduler itself.
    Conceal(ElementKey),
    /// The collect affordance finished fading out; swap in the ready one.
    RevealReady { panel: PanelId, generation: u32 },
    /// Play the "new segment unlocked" highlight.
    Highlight {
        panel: PanelId,
        generation: u32,
        segment: u32,
        count: u32,
    },
    /// Render title and indicator at the current completed count.
    SettleIndicator { panel: PanelId },
}

impl Cue {
    fn panel(&self) -> Option<&PanelId> {
        match self {
            Cue::Conceal(key) => key.panel(),
            Cue::RevealReady { panel, .. }
            | Cue::Highlight { panel, .. }
            | Cue::SettleIndicator { panel } => Some(panel),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MotionError {
    #[error("element {0:?} is not on stage")]
    UnknownElement(ElementKey),
    #[error("too many tweens in flight (limit {limit})")]
    Saturated { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

#[derive(Debug)]
struct Tween {
    id: TweenId,
    key: ElementKey,
    from: Props,
    to: Props,
    start: Duration,
    timing: FadeTiming,
    then: Option<Cue>,
}

impl Tween {
    fn end(&self) -> Duration {
        self.start + self.timing.duration
    }

    fn step(&self, now: Duration, stage: &mut Stage) {
        let total = self.timing.duration.as_secs_f32();
        let linear = if total <= 0.0 {
            1.0
        } else {
            now.saturating_sub(self.start).as_secs_f32() / total
        };
        let eased = self.timing.easing.apply(linear);
        let lerp = |from: Option<f32>, to: Option<f32>| match (from, to) {
            (Some(from), Some(to)) => Some(from + (to - from) * eased),
            _ => None,
        };
        stage.apply(
            &self.key,
            Props {
                opacity: lerp(self.from.opacity, self.to.opacity),
                scale: lerp(self.from.scale, self.to.scale),
            },
        );
    }
}

#[derive(Debug)]
struct Timer {
    seq: u64,
    due: Duration,
    cue: Cue,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    tweens: Vec<Tween>,
    timers: Vec<Timer>,
    tween_limit: Option<usize>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler that refuses to run more than `limit` tweens at once.
    #[must_use]
    pub fn with_tween_limit(limit: usize) -> Self {
        Self {
            tween_limit: Some(limit),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty() && self.timers.is_empty()
    }

    #[must_use]
    pub fn is_running(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|tween| tween.id == id)
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Apply `props` immediately.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::UnknownElement` if `key` is not registered.
    pub fn set(&mut self, stage: &mut Stage, key: &ElementKey, props: Props) -> Result<(), MotionError> {
        if !stage.contains(key) {
            return Err(MotionError::UnknownElement(key.clone()));
        }
        stage.apply(key, props);
        Ok(())
    }

    /// Tween `key` towards `to`, firing `then` once it lands.
    ///
    /// # Errors
    ///
    /// Returns `MotionError` if the element is unknown or the tween budget is spent.
    pub fn animate(
        &mut self,
        stage: &mut Stage,
        key: &ElementKey,
        to: Props,
        timing: FadeTiming,
        then: Option<Cue>,
    ) -> Result<TweenId, MotionError> {
        let Some(visual) = stage.visual(key) else {
            return Err(MotionError::UnknownElement(key.clone()));
        };
        if let Some(limit) = self.tween_limit {
            if self.tweens.len() >= limit {
                return Err(MotionError::Saturated { limit });
            }
        }
        let id = TweenId(self.next_seq());
        self.tweens.push(Tween {
            id,
            key: key.clone(),
            from: Props::faded(visual.opacity, visual.scale),
            to,
            start: self.now,
            timing,
            then,
        });
        Ok(id)
    }

    /// Fire `cue` after `after` has elapsed.
    pub fn delay(&mut self, after: Duration, cue: Cue) {
        let seq = self.next_seq();
        self.timers.push(Timer {
            seq,
            due: self.now + after,
            cue,
        });
    }

    /// Jump a running tween to its end state. Returns its cue unless the
    /// scheduler consumed it.
    pub fn finish(&mut self, id: TweenId, stage: &mut Stage) -> Option<Cue> {
        let index = self.tweens.iter().position(|tween| tween.id == id)?;
        let tween = self.tweens.remove(index);
        stage.apply(&tween.key, tween.to);
        tween.then.and_then(|cue| absorb(cue, stage))
    }

    /// Drop every tween and pending cue that touches `panel`, leaving its
    /// elements wherever they are now. Returns how many were dropped.
    pub fn cancel_panel(&mut self, panel: &PanelId) -> usize {
        let before = self.tweens.len() + self.timers.len();
        self.tweens.retain(|tween| {
            tween.key.panel() != Some(panel) && tween.then.as_ref().and_then(Cue::panel) != Some(panel)
        });
        self.timers.retain(|timer| timer.cue.panel() != Some(panel));
        before - self.tweens.len() - self.timers.len()
    }

    /// Move time forward by `dt` and collect the cues that came due.
    pub fn advance(&mut self, dt: Duration, stage: &mut Stage) -> Vec<Cue> {
        let now = self.now + dt;
        self.now = now;

        let mut due: Vec<(Duration, u64, Option<Cue>)> = Vec::new();
        let mut running = Vec::with_capacity(self.tweens.len());
        for tween in std::mem::take(&mut self.tweens) {
            if tween.end() <= now {
                stage.apply(&tween.key, tween.to);
                due.push((tween.end(), tween.id.0, tween.then));
            } else {
                tween.step(now, stage);
                running.push(tween);
            }
        }
        self.tweens = running;

        let (fired, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|timer| timer.due <= now);
        self.timers = pending;
        due.extend(fired.into_iter().map(|timer| (timer.due, timer.seq, Some(timer.cue))));

        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter()
            .filter_map(|(_, _, cue)| cue.and_then(|cue| absorb(cue, stage)))
            .collect()
    }
}

fn absorb(cue: Cue, stage: &mut Stage) -> Option<Cue> {
    match cue {
        Cue::Conceal(key) => {
            stage.conceal(&key);
            None
        }
        other => Some(other),
    }
}

/// The animation capability, selected once and handed to every component
/// that moves things on stage.
#[derive(Debug)]
pub struct Motion {
    mode: MotionMode,
    scheduler: Scheduler,
}

impl Motion {
    #[must_use]
    pub fn new(mode: MotionMode) -> Self {
        Self::with_scheduler(mode, Scheduler::new())
    }

    #[must_use]
    pub fn with_scheduler(mode: MotionMode, scheduler: Scheduler) -> Self {
        Self { mode, scheduler }
    }

    #[must_use]
    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.mode.is_animated()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }
}
