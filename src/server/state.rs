use std::sync::Arc;

use crate::agent::Agent;
use crate::config::ChatConfig;
use crate::store::ConversationStore;

/// Shared application state accessible to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn Agent>,
    pub store: Arc<ConversationStore>,
    pub config: Arc<ChatConfig>,
}

impl AppState {
    pub fn new(
        agent: Arc<dyn Agent>,
        store: Arc<ConversationStore>,
        config: Arc<ChatConfig>,
    ) -> Self {
        Self {
            agent,
            store,
            config,
        }
    }
}
