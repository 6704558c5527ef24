//! In-memory conversation log
//!
//! `ConversationStore` is the single owner of the process-wide transcript.
//! It is shared through the server state and guarded by a lock so that
//! append, snapshot, and clear are atomic with respect to each other on a
//! multi-threaded runtime.

use std::sync::RwLock;

use crate::types::ConversationTurn;

/// Append-only ordered log of conversation turns
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the end of the log
    pub fn append(&self, turn: ConversationTurn) {
        tracing::debug!(role = %turn.role, len = turn.content.len(), "Appending turn");
        self.write().push(turn);
    }

    /// Snapshot of every turn in chronological order.
    ///
    /// The returned vector is a copy; later appends or clears do not affect it.
    pub fn all(&self) -> Vec<ConversationTurn> {
        self.read().clone()
    }

    /// Remove every turn
    pub fn clear(&self) {
        let removed = {
            let mut turns = self.write();
            let removed = turns.len();
            turns.clear();
            removed
        };
        tracing::info!(removed, "Conversation history cleared");
    }

    /// Number of stored turns
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The Vec stays valid after a panicking writer, so poisoning is ignored.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ConversationTurn>> {
        self.turns.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<ConversationTurn>> {
        self.turns.write().unwrap_or_else(|e| e.into_inner())
    }
}
