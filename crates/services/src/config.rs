use quest_core::{MotionMode, MotionTimings};
use storage::PROGRESS_KEY;

/// Startup knobs for a [`Game`](crate::Game).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub motion: MotionMode,
    pub timings: MotionTimings,
    /// Key the progress record is stored under.
    pub storage_key: String,
    /// Cap on concurrently running tweens; `None` means unbounded.
    pub tween_limit: Option<usize>,
}

impl GameConfig {
    #[must_use]
    pub fn new(motion: MotionMode) -> Self {
        Self {
            motion,
            ..Self::default()
        }
    }

    /// Pick the motion mode from host capabilities.
    #[must_use]
    pub fn detect(animation_available: bool, reduced_motion: bool) -> Self {
        Self::new(MotionMode::select(animation_available, reduced_motion))
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_tween_limit(mut self, limit: usize) -> Self {
        self.tween_limit = Some(limit);
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            motion: MotionMode::default(),
            timings: MotionTimings::default(),
            storage_key: PROGRESS_KEY.to_owned(),
            tween_limit: None,
        }
    }
}
