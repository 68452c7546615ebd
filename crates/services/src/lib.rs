#![forbid(unsafe_code)]

pub mod activation;
pub mod config;
pub mod error;
pub mod game;
pub mod intent;
pub mod navigator;
pub mod progress;
pub mod reward;
pub mod scheduler;
pub mod stage;

pub use activation::{ActivationRegistry, BindOptions, InputEvent, KeyPress};
pub use config::GameConfig;
pub use error::{NavigationError, RewardError};
pub use game::Game;
pub use intent::{Action, Target};
pub use navigator::{ExclusiveGroup, Member, NavOutcome, Navigator, SwitchOutcome, TransitionPhase};
pub use progress::{ProgressSession, ProgressTracker};
pub use reward::{Claim, RewardSequencer};
pub use scheduler::{Cue, Motion, MotionError, Scheduler, TweenId};
pub use stage::{ElementKey, PanelId, Props, Stage, Visual};
