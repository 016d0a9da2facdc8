use crate::{config::Config, live::LiveEngine};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub engine: LiveEngine,
    pub config: Config,
}

impl FromRef<AppState> for LiveEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
