//! Role-tagged conversation history sent to the model on every turn

use super::turn::TurnId;
use crate::llm::{ChatMessage, ChatRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub message: ChatMessage,
    /// Turn that added this entry; `None` for the system prompt
    pub turn: Option<TurnId>,
}

/// Ordered history mirroring the turn log, shaped for the completion endpoint
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.entries.push(HistoryEntry {
            message: ChatMessage::system(content),
            turn: None,
        });
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>, turn: TurnId) {
        self.entries.push(HistoryEntry {
            message: ChatMessage::new(role, content),
            turn: Some(turn),
        });
    }

    /// Remove every entry added by `turn`, newest first. Returns how many went.
    pub fn remove_turn(&mut self, turn: TurnId) -> usize {
        let mut removed = 0;
        for index in (0..self.entries.len()).rev() {
            if self.entries[index].turn == Some(turn) {
                self.entries.remove(index);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }
}
