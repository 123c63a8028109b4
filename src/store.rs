//! Ordered turn log with upsert-by-identity as the single write primitive

use crate::conversation::{Turn, TurnId};

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    turns: Vec<Turn>,
}

/// What an upsert did to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced { index: usize },
    Appended { index: usize },
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the turn with the same identity in place, or append it.
    pub fn upsert(&mut self, turn: Turn) -> Upsert {
        if let Some(index) = self.position(turn.id()) {
            self.turns[index] = turn;
            Upsert::Replaced { index }
        } else {
            self.turns.push(turn);
            Upsert::Appended {
                index: self.turns.len() - 1,
            }
        }
    }

    /// Turns in display order
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id() == id)
    }

    pub fn remove(&mut self, id: TurnId) -> Option<Turn> {
        self.position(id).map(|index| self.turns.remove(index))
    }

    pub fn remove_last(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn position(&self, id: TurnId) -> Option<usize> {
        self.turns.iter().rposition(|t| t.id() == id)
    }
}
