// src/state.rs
use std::sync::Arc;

use crate::services::upstream::TextGenerator;

pub type SharedState = Arc<AppState>;

// `api_key_set` is always true once the server is up: startup refuses to run
// without a key. It is still reported so the browser can show it.
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub history_enabled: bool,
    pub api_key_set: bool,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            history_enabled: true,
            api_key_set: true,
        }
    }

    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history_enabled = enabled;
        self
    }
}
