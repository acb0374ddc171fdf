// Application state for HTTP handlers
use crate::application::history_service::SharedHistory;
use crate::application::visibility::{RendererReadiness, VisibilityStore};

#[derive(Clone)]
pub struct AppState {
    pub history: SharedHistory,
    pub visibility_store: VisibilityStore,
    pub readiness: RendererReadiness,
}
