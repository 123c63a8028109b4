//! Conversation data model: turns, history, context

mod context;
mod history;
mod turn;

pub use context::{ConversationContext, LanguagePair, Scenario};
pub use history::{History, HistoryEntry};
pub use turn::{TranslationTarget, Turn, TurnId, WordTranslations};
