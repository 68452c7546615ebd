use std::sync::Arc;

use quest_core::model::GameLayout;
use services::{Game, GameConfig};
use storage::KeyValueStore;
use tracing::debug;

pub trait UiApp: Send + Sync {
    fn layout(&self) -> GameLayout;
    fn config(&self) -> GameConfig;
    fn store(&self) -> Arc<dyn KeyValueStore>;
}

#[derive(Clone)]
pub struct AppContext {
    layout: GameLayout,
    config: GameConfig,
    store: Arc<dyn KeyValueStore>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            layout: app.layout(),
            config: app.config(),
            store: app.store(),
        }
    }

    #[must_use]
    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// A booted game over the shared store.
    #[must_use]
    pub fn start_game(&self) -> Game {
        debug!(mode = ?self.config.motion, key = %self.config.storage_key, "starting game");
        let mut game = Game::new(&self.config, self.layout.clone(), Arc::clone(&self.store));
        game.boot();
        game
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
