//! Per-turn pipeline state

use crate::conversation::{TranslationTarget, Turn};

/// Where a turn is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Opening turn waiting for the translated opening line
    OpeningPending,
    /// Opening line shown, waiting for its word translations
    OpeningTranslating,
    /// Opening line never arrived; the empty turn stays in the log
    OpeningFailed,
    /// User turn waiting for correction and reply
    Stage1Pending,
    /// Both word translations dispatched; flags record which have landed
    Stage2Pending {
        correction_done: bool,
        reply_done: bool,
    },
    /// Every field the pipeline fills is settled
    Completed,
    /// Compensation ran: turn removed, history entries removed, input restored
    RolledBack,
}

impl TurnPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TurnPhase::OpeningFailed | TurnPhase::Completed | TurnPhase::RolledBack
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TurnPhase::OpeningPending => "opening_pending",
            TurnPhase::OpeningTranslating => "opening_translating",
            TurnPhase::OpeningFailed => "opening_failed",
            TurnPhase::Stage1Pending => "stage1_pending",
            TurnPhase::Stage2Pending { .. } => "stage2_pending",
            TurnPhase::Completed => "completed",
            TurnPhase::RolledBack => "rolled_back",
        }
    }

    /// Whether the given stage-2 translation has already landed
    pub(crate) fn translation_done(self, target: TranslationTarget) -> bool {
        match (self, target) {
            (
                TurnPhase::Stage2Pending {
                    correction_done, ..
                },
                TranslationTarget::Correction,
            ) => correction_done,
            (TurnPhase::Stage2Pending { reply_done, .. }, TranslationTarget::Reply) => reply_done,
            _ => false,
        }
    }
}

/// Local copy of a turn plus its phase. Mutated only by `transition`;
/// every meaningful change is committed to the store as a whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnState {
    pub turn: Turn,
    pub phase: TurnPhase,
}

impl TurnState {
    pub fn new(turn: Turn, phase: TurnPhase) -> Self {
        Self { turn, phase }
    }
}
