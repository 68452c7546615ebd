//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::{ScreenId, TaskId};

use crate::stage::PanelId;

/// Content errors raised by screen and task navigation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("screen {0:?} not found")]
    UnknownScreen(ScreenId),
    #[error("task {0:?} not found")]
    UnknownTask(TaskId),
    #[error("no tasks are registered")]
    NoTasks,
}

/// Content errors raised while rendering a reward panel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewardError {
    #[error("task {0:?} has no element")]
    MissingTask(TaskId),
    #[error("no result container available for task {0:?}")]
    MissingResultContainer(TaskId),
    #[error("panel {0:?} lacks its collect or ready affordance")]
    MissingAffordance(PanelId),
}
