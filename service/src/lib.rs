use bytes::Bytes;
use config::Config;
use sse::Manager;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod logging;
pub mod static_document;

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<Manager>,
    index_html: Bytes,
}

impl AppState {
    pub fn new(app_config: Config, sse_manager: &Arc<Manager>, index_html: Bytes) -> Self {
        Self {
            config: app_config,
            sse_manager: Arc::clone(sse_manager),
            index_html,
        }
    }

    /// The HTML document served at `/`. Cheap to clone per request.
    pub fn index_html(&self) -> Bytes {
        self.index_html.clone()
    }
}
