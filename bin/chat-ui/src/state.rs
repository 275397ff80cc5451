//! Shared state injected into every UI handler.

use std::sync::Arc;

use crate::client::ChatBackend;
use crate::config::Config;
use crate::render::Renderer;
use crate::session::SessionRegistry;

pub struct UiState {
    pub config: Arc<Config>,
    /// Where submitted messages go.
    pub backend: Arc<dyn ChatBackend>,
    pub sessions: SessionRegistry,
    pub renderer: Renderer,
}
