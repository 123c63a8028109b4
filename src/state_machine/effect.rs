//! Effects produced by state transitions

use crate::conversation::{Turn, TurnId};
use crate::llm::{ChatRole, LlmError, LlmErrorKind};

/// Last error surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl ErrorSignal {
    pub fn from_llm(context: &str, error: &LlmError) -> Self {
        Self {
            kind: error.kind,
            message: format!("{context}: {}", error.describe()),
        }
    }
}

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Upsert the turn record into the message store
    CommitTurn(Turn),

    /// Remove the turn from the message store
    RemoveTurn(TurnId),

    AppendHistory {
        role: ChatRole,
        content: String,
        turn: TurnId,
    },

    /// Remove every history entry the turn added
    RemoveHistory(TurnId),

    ClearPendingInput,

    /// Put the submitted text back so the user can resubmit without retyping
    RestorePendingInput(String),

    RaiseError(ErrorSignal),

    /// Dispatch the stage-1 correction + reply call
    RequestTurn,

    /// Dispatch both stage-2 translations concurrently
    RequestTranslations,

    /// Dispatch the opening line translation
    RequestOpening,

    /// Dispatch the word translation of the opening line
    RequestOpeningTranslation,
}

impl Effect {
    pub fn append_history(role: ChatRole, content: impl Into<String>, turn: TurnId) -> Self {
        Effect::AppendHistory {
            role,
            content: content.into(),
            turn,
        }
    }
}
