//! Property-based tests for the turn state machine
//!
//! Effects are applied to a small in-memory model of the session so the
//! invariants can be checked against the state the executor would produce:
//! - A rolled-back turn leaves the store, history and input buffer as they
//!   were before the submit
//! - Compensation runs at most once per turn, whatever the outcome order
//! - A turn whose calls all succeed completes with every field filled

use super::*;
use crate::conversation::{TranslationTarget, TurnId, WordTranslations};
use crate::llm::LlmError;
use crate::translation::TurnReply;
use proptest::prelude::*;

// ============================================================================
// Session model
// ============================================================================

#[derive(Debug, Default)]
struct Model {
    turns: Vec<(TurnId, bool)>,
    history: Vec<TurnId>,
    pending: String,
    errors: usize,
    removals: usize,
    restores: usize,
}

impl Model {
    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::CommitTurn(turn) => {
                    let done = turn.reply_translation.is_some()
                        && turn.corrected_user_message_translation.is_some();
                    match self.turns.iter().rposition(|(id, _)| *id == turn.id()) {
                        Some(i) => self.turns[i].1 = done,
                        None => self.turns.push((turn.id(), done)),
                    }
                }
                Effect::RemoveTurn(id) => {
                    self.removals += 1;
                    self.turns.retain(|(t, _)| t != id);
                }
                Effect::AppendHistory { turn, .. } => self.history.push(*turn),
                Effect::RemoveHistory(id) => self.history.retain(|t| t != id),
                Effect::ClearPendingInput => self.pending.clear(),
                Effect::RestorePendingInput(text) => {
                    self.restores += 1;
                    self.pending.clone_from(text);
                }
                Effect::RaiseError(_) => self.errors += 1,
                Effect::RequestTurn
                | Effect::RequestTranslations
                | Effect::RequestOpening
                | Effect::RequestOpeningTranslation => {}
            }
        }
    }
}

// ============================================================================
// Generators
// ============================================================================

fn arb_error() -> impl Strategy<Value = LlmError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(LlmError::transport),
        Just(LlmError::empty_body()),
        "[a-z ]{1,20}".prop_map(LlmError::malformed_envelope),
        "[a-z ]{1,20}".prop_map(LlmError::api_reported),
        "[a-z ]{1,20}".prop_map(LlmError::malformed_payload),
    ]
}

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Zäö]{1,8}[,.!?]?", 1..8)
}

fn arb_reply() -> impl Strategy<Value = TurnReply> {
    (prop::option::of(arb_words()), arb_words(), arb_words()).prop_map(
        |(split, corrected, reply)| TurnReply {
            split,
            corrected,
            reply,
        },
    )
}

fn arb_outcome() -> impl Strategy<Value = Result<WordTranslations, LlmError>> {
    prop_oneof![
        prop::collection::hash_map("[a-z]{1,6}", "[a-z]{1,6}", 0..5).prop_map(Ok),
        arb_error().prop_map(Err),
    ]
}

/// Both stage-2 outcomes, in the order they resolve
fn arb_stage2() -> impl Strategy<Value = Vec<Event>> {
    (arb_outcome(), arb_outcome(), any::<bool>()).prop_map(|(correction, reply, reply_first)| {
        let correction = Event::from_translation(TranslationTarget::Correction, correction);
        let reply = Event::from_translation(TranslationTarget::Reply, reply);
        if reply_first {
            vec![reply, correction]
        } else {
            vec![correction, reply]
        }
    })
}

/// Submit a user turn on top of `model` and drive it with `events`
fn run_turn(model: &mut Model, text: &str, events: Vec<Event>) -> TurnState {
    let started = start_turn(text);
    model.apply(&started.effects);
    let mut state = started.new_state;
    for event in events {
        let result = transition(&state, event).expect("every generated event is valid");
        model.apply(&result.effects);
        state = result.new_state;
    }
    state
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_stage2_outcomes_settle_consistently(
        text in "[a-zA-Z ]{1,30}",
        reply in arb_reply(),
        stage2 in arb_stage2(),
    ) {
        let mut model = Model::default();
        let any_failed = stage2
            .iter()
            .any(|e| matches!(e, Event::TranslationFailed { .. }));
        let failures = stage2
            .iter()
            .filter(|e| matches!(e, Event::TranslationFailed { .. }))
            .count();

        let mut events = vec![Event::Stage1Received { reply }];
        events.extend(stage2);
        let state = run_turn(&mut model, &text, events);

        prop_assert!(model.removals <= 1);
        prop_assert!(model.restores <= 1);
        prop_assert_eq!(model.errors, failures);

        if any_failed {
            prop_assert_eq!(state.phase, TurnPhase::RolledBack);
            prop_assert!(model.turns.is_empty());
            prop_assert!(model.history.is_empty());
            prop_assert_eq!(&model.pending, &text);
        } else {
            prop_assert_eq!(state.phase, TurnPhase::Completed);
            prop_assert_eq!(model.turns.len(), 1);
            prop_assert!(model.turns[0].1);
            prop_assert_eq!(model.history.len(), 2);
            prop_assert!(model.pending.is_empty());
        }
    }

    #[test]
    fn prop_stage1_failure_restores_prior_state(
        earlier in prop::collection::vec(("[a-z ]{1,10}", arb_reply()), 0..4),
        text in "[a-zA-Z ]{1,30}",
        error in arb_error(),
    ) {
        let mut model = Model::default();
        for (earlier_text, reply) in earlier {
            let events = vec![
                Event::Stage1Received { reply },
                Event::from_translation(TranslationTarget::Correction, Ok(WordTranslations::new())),
                Event::from_translation(TranslationTarget::Reply, Ok(WordTranslations::new())),
            ];
            run_turn(&mut model, &earlier_text, events);
        }
        let turns_before = model.turns.clone();
        let history_before = model.history.clone();

        let state = run_turn(&mut model, &text, vec![Event::Stage1Failed { error }]);

        prop_assert_eq!(state.phase, TurnPhase::RolledBack);
        prop_assert_eq!(model.turns, turns_before);
        prop_assert_eq!(model.history, history_before);
        prop_assert_eq!(model.pending, text);
    }

    #[test]
    fn prop_rolled_back_absorbs_late_outcomes(
        late in arb_outcome(),
        target_is_reply in any::<bool>(),
    ) {
        let rolled_back = TurnState::new(
            crate::conversation::Turn::from_user("Moi"),
            TurnPhase::RolledBack,
        );
        let target = if target_is_reply {
            TranslationTarget::Reply
        } else {
            TranslationTarget::Correction
        };
        let late_failed = late.is_err();
        let result = transition(&rolled_back, Event::from_translation(target, late)).unwrap();

        prop_assert_eq!(&result.new_state, &rolled_back);
        prop_assert!(result.effects.iter().all(|e| matches!(e, Effect::RaiseError(_))));
        prop_assert_eq!(result.effects.len(), usize::from(late_failed));
    }

    #[test]
    fn prop_opening_turn_never_rolls_back(
        reply in arb_words(),
        opening_ok in any::<bool>(),
        translation in arb_outcome(),
    ) {
        let mut model = Model::default();
        let started = start_opening();
        model.apply(&started.effects);
        let opening = if opening_ok { Ok(reply) } else { Err(LlmError::empty_body()) };
        let result = transition(&started.new_state, Event::from_opening(opening)).unwrap();
        model.apply(&result.effects);
        let mut state = result.new_state;

        if opening_ok {
            let result = transition(
                &state,
                Event::from_translation(TranslationTarget::Reply, translation),
            )
            .unwrap();
            model.apply(&result.effects);
            state = result.new_state;
            prop_assert_eq!(state.phase, TurnPhase::Completed);
            prop_assert_eq!(model.history.len(), 1);
        } else {
            prop_assert_eq!(state.phase, TurnPhase::OpeningFailed);
            prop_assert_eq!(model.errors, 1);
        }

        prop_assert_eq!(model.removals, 0);
        prop_assert_eq!(model.turns.len(), 1);
    }
}
