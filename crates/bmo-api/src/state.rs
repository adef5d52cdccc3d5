//! Application state shared across all route handlers.
//!
//! Services are constructed once at startup by the binary and handed to
//! the router here; handlers receive them through axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use bmo_chat::ConversationOrchestrator;
use bmo_core::config::BmoConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Read-only application configuration.
    pub config: Arc<BmoConfig>,
    /// Conversation core: sessions, model fallback, speech.
    pub conversation: Arc<ConversationOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: BmoConfig, conversation: ConversationOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            conversation: Arc::new(conversation),
            start_time: Instant::now(),
        }
    }
}
