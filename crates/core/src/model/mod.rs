mod ids;
mod layout;
mod progress;

pub use ids::{ParseIdError, ScreenId, TaskId};
pub use layout::{GameLayout, GameLayoutDraft, LayoutError, PanelMarkup, STANDARD_TASKS, TaskLayout};
pub use progress::{MAX_POINTS, ProgressState, displayed_points, format_title};
