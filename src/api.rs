//! HTTP API for the chat widget

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::assistants::AssistantsApi;
use crate::runtime::{SessionManager, SessionSettings};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(api: Arc<dyn AssistantsApi>, settings: SessionSettings) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(api, settings)),
        }
    }
}
