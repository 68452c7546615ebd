use std::time::Duration;

/// How visual transitions are applied, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    /// Cross-fades, staged reward reveal and delayed highlight.
    #[default]
    Animated,
    /// Immediate state changes; only the fixed reward delay is kept.
    Instant,
}

impl MotionMode {
    /// Animated only when an animation capability exists and the user did not
    /// ask for reduced motion.
    #[must_use]
    pub fn select(animation_available: bool, reduced_motion: bool) -> Self {
        if animation_available && !reduced_motion {
            Self::Animated
        } else {
            Self::Instant
        }
    }

    #[must_use]
    pub fn is_animated(self) -> bool {
        matches!(self, Self::Animated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    Power1Out,
    #[default]
    Power2Out,
}

impl Easing {
    /// Map linear progress `t` in `0..=1` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTiming {
    pub duration: Duration,
    pub easing: Easing,
}

impl FadeTiming {
    #[must_use]
    pub const fn new(millis: u64, easing: Easing) -> Self {
        Self {
            duration: Duration::from_millis(millis),
            easing,
        }
    }
}

/// Durations and curves of every animated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionTimings {
    pub screen_out: FadeTiming,
    pub screen_in: FadeTiming,
    pub task_out: FadeTiming,
    pub task_in: FadeTiming,
    pub collect_out: FadeTiming,
    pub ready_in: FadeTiming,
    pub highlight: FadeTiming,
    /// Pause between collecting a reward and revealing the new count.
    pub reward_delay: Duration,
}

impl Default for MotionTimings {
    fn default() -> Self {
        Self {
            screen_out: FadeTiming::new(300, Easing::Power1Out),
            screen_in: FadeTiming::new(350, Easing::Power2Out),
            task_out: FadeTiming::new(250, Easing::Power1Out),
            task_in: FadeTiming::new(300, Easing::Power2Out),
            collect_out: FadeTiming::new(350, Easing::Power2Out),
            ready_in: FadeTiming::new(450, Easing::Power2Out),
            highlight: FadeTiming::new(500, Easing::Power2Out),
            reward_delay: Duration::from_millis(1000),
        }
    }
}
