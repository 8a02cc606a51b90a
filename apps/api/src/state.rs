use std::sync::Arc;

use crate::dialogue::session::ChatService;
use crate::store::{ConversationMemory, JobRepository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub jobs: Arc<dyn JobRepository>,
    pub memory: Arc<dyn ConversationMemory>,
}
