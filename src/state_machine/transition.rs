//! Pure state transition function
//!
//! Given the same state and event this always yields the same new state and
//! effects. The executor applies the effects; nothing here performs I/O.
//!
//! Rollback is idempotent: compensation effects are emitted only on the
//! transition into `RolledBack`. A later failure of the sibling translation
//! only raises the error, and a later success is dropped so the removed turn
//! is not re-appended.

use super::{Effect, ErrorSignal, Event, TurnPhase, TurnState};
use crate::conversation::{TranslationTarget, Turn};
use crate::llm::{ChatRole, LlmError};
use thiserror::Error;

const OPENING_INVALID: &str = "conversation start response was not valid";
const TRANSLATION_ERROR: &str = "translation error";
const TURN_ERROR: &str = "could not get a reply";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Turn already finished ({0})")]
    AlreadyTerminal(&'static str),
    #[error("Translation for {0} already received")]
    DuplicateTranslation(&'static str),
    #[error("Invalid transition: {event} in {phase}")]
    InvalidTransition {
        phase: &'static str,
        event: &'static str,
    },
}

/// Create the system-initiated opening turn
pub fn start_opening() -> TransitionResult {
    let turn = Turn::opening();
    let commit = Effect::CommitTurn(turn.clone());
    TransitionResult::new(TurnState::new(turn, TurnPhase::OpeningPending))
        .with_effect(commit)
        .with_effect(Effect::RequestOpening)
}

/// Create a user turn for `text`, visible in the log before any reply exists
pub fn start_turn(text: &str) -> TransitionResult {
    let turn = Turn::from_user(text);
    let id = turn.id();
    let commit = Effect::CommitTurn(turn.clone());
    TransitionResult::new(TurnState::new(turn, TurnPhase::Stage1Pending))
        .with_effect(commit)
        .with_effect(Effect::append_history(ChatRole::User, text, id))
        .with_effect(Effect::ClearPendingInput)
        .with_effect(Effect::RequestTurn)
}

/// Pure transition function
#[allow(clippy::too_many_lines)]
pub fn transition(state: &TurnState, event: Event) -> Result<TransitionResult, TransitionError> {
    let mut turn = state.turn.clone();
    let id = turn.id();

    match (state.phase, event) {
        // ============================================================
        // Opening turn
        // ============================================================
        (TurnPhase::OpeningPending, Event::OpeningReceived { reply }) => {
            let joined = reply.join(" ");
            turn.reply = Some(reply);
            let commit = Effect::CommitTurn(turn.clone());
            Ok(
                TransitionResult::new(TurnState::new(turn, TurnPhase::OpeningTranslating))
                    .with_effect(commit)
                    .with_effect(Effect::append_history(ChatRole::Assistant, joined, id))
                    .with_effect(Effect::RequestOpeningTranslation),
            )
        }

        // Nothing to restore: the bootstrap turn had no input
        (TurnPhase::OpeningPending, Event::OpeningFailed { error }) => Ok(TransitionResult::new(
            TurnState::new(turn, TurnPhase::OpeningFailed),
        )
        .with_effect(Effect::RaiseError(ErrorSignal::from_llm(
            OPENING_INVALID,
            &error,
        )))),

        (
            TurnPhase::OpeningTranslating,
            Event::TranslationReceived {
                target: TranslationTarget::Reply,
                translations,
            },
        ) => {
            turn.reply_translation = Some(translations);
            let commit = Effect::CommitTurn(turn.clone());
            Ok(TransitionResult::new(TurnState::new(turn, TurnPhase::Completed)).with_effect(commit))
        }

        // The reply stays readable without its translation
        (
            TurnPhase::OpeningTranslating,
            Event::TranslationFailed {
                target: TranslationTarget::Reply,
                error,
            },
        ) => {
            let commit = Effect::CommitTurn(turn.clone());
            Ok(
                TransitionResult::new(TurnState::new(turn, TurnPhase::Completed))
                    .with_effect(Effect::RaiseError(ErrorSignal::from_llm(
                        TRANSLATION_ERROR,
                        &error,
                    )))
                    .with_effect(commit),
            )
        }

        // ============================================================
        // Stage 1: correction + reply
        // ============================================================
        (TurnPhase::Stage1Pending, Event::Stage1Received { reply }) => {
            let joined = reply.reply.join(" ");
            turn.split_user_message = reply.split;
            turn.corrected_user_message = Some(reply.corrected);
            turn.reply = Some(reply.reply);
            let commit = Effect::CommitTurn(turn.clone());
            Ok(TransitionResult::new(TurnState::new(
                turn,
                TurnPhase::Stage2Pending {
                    correction_done: false,
                    reply_done: false,
                },
            ))
            .with_effect(commit)
            .with_effect(Effect::append_history(ChatRole::Assistant, joined, id))
            .with_effect(Effect::RequestTranslations))
        }

        (TurnPhase::Stage1Pending, Event::Stage1Failed { error }) => {
            Ok(rollback(turn, TURN_ERROR, &error))
        }

        // ============================================================
        // Stage 2: word translations, in either order
        // ============================================================
        (
            phase @ TurnPhase::Stage2Pending {
                correction_done,
                reply_done,
            },
            Event::TranslationReceived {
                target,
                translations,
            },
        ) => {
            if phase.translation_done(target) {
                return Err(TransitionError::DuplicateTranslation(target.as_str()));
            }
            turn.set_translations(target, translations);
            let (correction_done, reply_done) = match target {
                TranslationTarget::Correction => (true, reply_done),
                TranslationTarget::Reply => (correction_done, true),
            };
            let next = if correction_done && reply_done {
                TurnPhase::Completed
            } else {
                TurnPhase::Stage2Pending {
                    correction_done,
                    reply_done,
                }
            };
            let commit = Effect::CommitTurn(turn.clone());
            Ok(TransitionResult::new(TurnState::new(turn, next)).with_effect(commit))
        }

        (phase @ TurnPhase::Stage2Pending { .. }, Event::TranslationFailed { target, error }) => {
            if phase.translation_done(target) {
                return Err(TransitionError::DuplicateTranslation(target.as_str()));
            }
            Ok(rollback(turn, TRANSLATION_ERROR, &error))
        }

        // ============================================================
        // After rollback: the sibling translation resolves late
        // ============================================================
        (TurnPhase::RolledBack, Event::TranslationReceived { .. }) => {
            Ok(TransitionResult::new(state.clone()))
        }

        (TurnPhase::RolledBack, Event::TranslationFailed { error, .. }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::RaiseError(
                ErrorSignal::from_llm(TRANSLATION_ERROR, &error),
            )))
        }

        // ============================================================
        // Everything else is a bug in the driver
        // ============================================================
        (phase, _) if phase.is_terminal() => Err(TransitionError::AlreadyTerminal(phase.as_str())),

        (phase, event) => Err(TransitionError::InvalidTransition {
            phase: phase.as_str(),
            event: event.name(),
        }),
    }
}

/// Compensation for a failed user turn
fn rollback(turn: Turn, context: &str, error: &LlmError) -> TransitionResult {
    let id = turn.id();
    let restore = turn.user_message.clone().unwrap_or_default();
    TransitionResult::new(TurnState::new(turn, TurnPhase::RolledBack)).with_effects([
        Effect::RaiseError(ErrorSignal::from_llm(context, error)),
        Effect::RestorePendingInput(restore),
        Effect::RemoveHistory(id),
        Effect::RemoveTurn(id),
    ])
}
