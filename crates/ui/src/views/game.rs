use std::time::Duration;

use dioxus::document::eval;
use dioxus::prelude::*;
use services::{Game, InputEvent, KeyPress, Target};

use crate::context::AppContext;
use crate::vm::{GameVm, PanelVm, ScreenRole, ScreenVm};

use super::scripts::SCROLL_TO_TOP;

const FRAME: Duration = Duration::from_millis(16);

#[component]
pub fn GameView() -> Element {
    let ctx = use_context::<AppContext>();
    let game = use_context_provider(|| Signal::new(ctx.start_game()));
    use_frame_ticker(game);
    use_scroll_reset(game);

    let vm = GameVm::from_game(&game.read());

    rsx! {
        div { class: "game",
            for screen in vm.screens.iter() {
                {render_screen(screen, &vm)}
            }
        }
    }
}

/// Drive the game's scheduler from wall-clock frames while anything moves.
fn use_frame_ticker(mut game: Signal<Game>) {
    use_future(move || async move {
        let mut frames = tokio::time::interval(FRAME);
        let mut last = frames.tick().await;
        loop {
            let now = frames.tick().await;
            let dt = now.duration_since(last);
            last = now;
            if game.peek().is_animating() {
                game.write().tick(dt);
            }
        }
    });
}

fn use_scroll_reset(game: Signal<Game>) {
    let resets = use_memo(move || game.read().stage().scroll_resets());
    use_effect(move || {
        if resets() > 0 {
            let _ = eval(SCROLL_TO_TOP);
        }
    });
}

fn render_screen(screen: &ScreenVm, vm: &GameVm) -> Element {
    let class = screen.element.class(&format!("screen screen--{}", screen.id));
    let body = match screen.role {
        ScreenRole::Start => rsx! {
            div { class: "hero",
                h1 { class: "hero__title", "Leadership Quest" }
                p { class: "hero__lead", "Eight tasks, eight superpowers. Collect them all." }
                if vm.start_button {
                    Activatable { target: Target::StartButton, class: "hero__button", "Start the game" }
                }
            }
        },
        ScreenRole::Map => rsx! {
            h2 { class: "map__title", "Choose a task" }
            p { class: "map__progress", "Collected: {vm.completed}" }
            div { class: "map",
                for item in vm.items.iter() {
                    Activatable {
                        key: "{item.id}",
                        target: Target::TaskItem(item.id.clone()),
                        class: item.element.class(&format!("task-item task-item--{}", item.number)),
                        span { class: "task-item__number", "{item.number}" }
                        span { class: "task-item__label", "{item.label}" }
                        if item.element.marked {
                            span { class: "task-item__check", "✓" }
                        }
                    }
                }
            }
        },
        ScreenRole::Task => rsx! {
            if vm.back_button {
                Activatable { target: Target::BackButton, class: "back", "← Back to map" }
            }
            for task in vm.tasks.iter() {
                article {
                    key: "{task.id}",
                    id: "task-{task.id}",
                    class: task.element.class("task"),
                    style: "{task.element.style}",
                    hidden: task.element.hidden,
                    h2 { class: "task__title", "{task.label}" }
                    if let Some(panel) = task.panel.as_ref() {
                        {render_panel(panel)}
                    }
                }
            }
        },
        ScreenRole::Other => rsx! {},
    };

    rsx! {
        section {
            key: "{screen.id}",
            id: "{screen.id}",
            class: "{class}",
            style: "{screen.element.style}",
            hidden: screen.element.hidden,
            {body}
        }
    }
}

fn render_panel(panel: &PanelVm) -> Element {
    let collect_key = match &panel.collect_target {
        Target::Collect { generation, .. } => *generation,
        _ => 0,
    };

    rsx! {
        div { class: "result",
            if let Some((text, title)) = panel.title.as_ref() {
                h3 { class: "result__title", style: "{title.style}", "{text}" }
            }
            div { class: "result__points",
                for (index, segment) in panel.segments.iter().enumerate() {
                    span { key: "{index}", class: "result__point", style: "{segment.style}" }
                }
            }
            if let Some(collect) = panel.collect.as_ref() {
                Activatable {
                    key: "collect-{collect_key}",
                    target: panel.collect_target.clone(),
                    class: "result__collect",
                    style: collect.style.clone(),
                    hidden: collect.hidden,
                    "Collect the superpower"
                }
            }
            if let Some(ready) = panel.ready.as_ref() {
                div {
                    class: "result__ready",
                    style: "{ready.style}",
                    hidden: ready.hidden,
                    "Superpower collected"
                }
            }
            if panel.back {
                Activatable {
                    target: Target::ResultBack(panel.panel.clone()),
                    class: "result__back",
                    "Back to map"
                }
            }
        }
    }
}

/// An element that turns clicks and Enter/Space into its bound action.
#[component]
fn Activatable(
    target: Target,
    class: String,
    #[props(default)] style: String,
    #[props(default)] hidden: bool,
    children: Element,
) -> Element {
    let game = use_context::<Signal<Game>>();
    let bound = game.read().activation().is_bound(&target);
    let click_target = target.clone();
    let key_target = target;

    rsx! {
        div {
            class: "{class}",
            style: "{style}",
            hidden,
            role: if bound { "button" },
            tabindex: if bound { "0" },
            onclick: move |evt| {
                activate(game, &click_target, InputEvent::Click, || evt.prevent_default());
            },
            onkeydown: move |evt| {
                let press = key_press(&evt.data.key());
                activate(game, &key_target, InputEvent::KeyDown(press), || evt.prevent_default());
            },
            {children}
        }
    }
}

fn activate(mut game: Signal<Game>, target: &Target, event: InputEvent, suppress: impl FnOnce()) {
    if !event.activates() || !game.peek().activation().is_live(target) {
        return;
    }
    suppress();
    game.write().dispatch(target, &event);
}

fn key_press(key: &Key) -> KeyPress {
    match key {
        Key::Enter => KeyPress::Enter,
        Key::Character(value) => KeyPress::from_key_name(value),
        other => KeyPress::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_enter_map_to_activation_keys() {
        assert_eq!(key_press(&Key::Enter), KeyPress::Enter);
        assert_eq!(key_press(&Key::Character(" ".to_string())), KeyPress::Space);
        assert!(!InputEvent::KeyDown(key_press(&Key::Escape)).activates());
    }
}
