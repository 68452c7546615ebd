#![forbid(unsafe_code)]

pub mod model;
pub mod motion;

pub use motion::{Easing, FadeTiming, MotionMode, MotionTimings};
