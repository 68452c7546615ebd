use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::Router;
use quest_core::MotionMode;
use quest_core::model::GameLayout;
use services::GameConfig;
use storage::{InMemoryStore, KeyValueStore};

use crate::context::{UiApp, build_app_context};
use crate::routes::Route;

#[derive(Clone)]
struct TestApp {
    store: InMemoryStore,
    config: GameConfig,
}

impl UiApp for TestApp {
    fn layout(&self) -> GameLayout {
        GameLayout::standard()
    }

    fn config(&self) -> GameConfig {
        self.config.clone()
    }

    fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(self.store.clone())
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! { Router::<Route> {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub store: InMemoryStore,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// A harness over `store`, with animations off so every frame is final.
pub fn setup_view_harness(store: InMemoryStore) -> ViewHarness {
    let app = Arc::new(TestApp {
        store: store.clone(),
        config: GameConfig::new(MotionMode::Instant),
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app });
    ViewHarness { dom, store }
}
