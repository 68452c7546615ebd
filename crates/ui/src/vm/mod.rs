mod game_vm;

pub use game_vm::{
    ElementVm, GameVm, PanelVm, ScreenRole, ScreenVm, TaskItemVm, TaskVm, task_label,
};
