//! Turn orchestrator: drives each turn's pipeline against the translation client
//!
//! The orchestrator owns the session (message store, history, pending-input
//! buffer, error signal) and executes the effects produced by the pure
//! per-turn state machine. Remote calls are the only suspension points; the
//! session lock is never held across one.


pub use crate::state_machine::ErrorSignal;

use crate::conversation::{
    ConversationContext, History, HistoryEntry, TranslationTarget, Turn, TurnId,
};
use crate::state_machine::{
    start_opening, start_turn, transition, Effect, Event, TransitionResult, TurnPhase, TurnState,
};
use crate::store::MessageStore;
use crate::translation::{prompts, TranslationClient};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 128;

/// Caller precondition violations. Pipeline failures never come back this
/// way; they land in the error signal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("No conversation context selected")]
    NoActiveContext,
    #[error("A turn is still in progress")]
    TurnInFlight,
}

/// Session changes observable by the caller
#[derive(Debug, Clone)]
pub enum SessionEvent {
    TurnUpserted(Turn),
    TurnRemoved(TurnId),
    Error(ErrorSignal),
    Cleared,
}

#[derive(Debug, Default)]
struct Session {
    store: MessageStore,
    history: History,
    pending_input: String,
    last_error: Option<ErrorSignal>,
    context: Option<ConversationContext>,
    in_flight: bool,
    /// Bumped on every reset; effects from an older epoch are dropped
    epoch: u64,
}

impl Session {
    fn reset(&mut self) {
        self.store.clear();
        self.history.clear();
        self.pending_input.clear();
        self.last_error = None;
        self.in_flight = false;
        self.epoch += 1;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TurnOrchestrator<C: TranslationClient> {
    client: Arc<C>,
    session: Mutex<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl<C: TranslationClient> TurnOrchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            session: Mutex::new(Session::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start a fresh session for `context` and run its opening turn.
    ///
    /// Anything still in flight from the previous session is abandoned.
    pub async fn initialize_turn(&self, context: ConversationContext) -> TurnPhase {
        let (epoch, started) = {
            let mut session = lock(&self.session);
            session.reset();
            session
                .history
                .push_system(prompts::roleplay_system_prompt(
                    &context.scenario,
                    &context.languages,
                ));
            session.context = Some(context.clone());
            session.in_flight = true;
            (session.epoch, start_opening())
        };
        let _ = self.events.send(SessionEvent::Cleared);
        tracing::info!(
            epoch,
            target = %context.languages.target,
            starting = %context.languages.starting,
            "Starting conversation"
        );

        let _guard = InFlightGuard {
            session: &self.session,
            epoch,
        };
        self.drive(epoch, context, started).await
    }

    /// Submit a user message and run the correction, reply and translation
    /// stages. Returns the phase the turn settled in.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnPhase, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let (epoch, context) = {
            let mut session = lock(&self.session);
            let context = session
                .context
                .clone()
                .ok_or(SessionError::NoActiveContext)?;
            if session.in_flight {
                return Err(SessionError::TurnInFlight);
            }
            session.in_flight = true;
            session.last_error = None;
            (session.epoch, context)
        };

        let _guard = InFlightGuard {
            session: &self.session,
            epoch,
        };
        Ok(self.drive(epoch, context, start_turn(text)).await)
    }

    /// Clear the log and history, keeping the selected context
    pub fn restart(&self) {
        lock(&self.session).reset();
        let _ = self.events.send(SessionEvent::Cleared);
        tracing::info!("Conversation restarted");
    }

    /// Clear the log and history and forget the selected context
    pub fn reset_to_context_selection(&self) {
        {
            let mut session = lock(&self.session);
            session.reset();
            session.context = None;
        }
        let _ = self.events.send(SessionEvent::Cleared);
        tracing::info!("Returned to context selection");
    }

    pub fn turns(&self) -> Vec<Turn> {
        lock(&self.session).store.all().to_vec()
    }

    pub fn turn(&self, id: TurnId) -> Option<Turn> {
        lock(&self.session).store.get(id).cloned()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        lock(&self.session).history.entries().to_vec()
    }

    pub fn context(&self) -> Option<ConversationContext> {
        lock(&self.session).context.clone()
    }

    pub fn pending_input(&self) -> String {
        lock(&self.session).pending_input.clone()
    }

    pub fn set_pending_input(&self, text: impl Into<String>) {
        lock(&self.session).pending_input = text.into();
    }

    pub fn last_error(&self) -> Option<ErrorSignal> {
        lock(&self.session).last_error.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.session).in_flight
    }

    async fn drive(
        &self,
        epoch: u64,
        context: ConversationContext,
        started: TransitionResult,
    ) -> TurnPhase {
        let turn_id = started.new_state.turn.id();
        let driver = TurnDriver {
            orchestrator: self,
            epoch,
            context,
            state: Mutex::new(started.new_state),
        };

        let mut pending: VecDeque<Effect> = driver.apply(started.effects).into();
        while let Some(effect) = pending.pop_front() {
            pending.extend(driver.dispatch(effect).await);
        }

        let phase = lock(&driver.state).phase;
        tracing::info!(turn_id = %turn_id, phase = phase.as_str(), "Turn settled");
        phase
    }

    /// Apply state effects to the session; hand dispatch effects back
    fn apply_effects(&self, epoch: u64, effects: Vec<Effect>) -> Vec<Effect> {
        let mut dispatches = Vec::new();
        let mut session = lock(&self.session);
        if session.epoch != epoch {
            tracing::debug!(epoch, "Dropping effects from a reset session");
            return dispatches;
        }

        for effect in effects {
            match effect {
                Effect::CommitTurn(turn) => {
                    let outcome = session.store.upsert(turn.clone());
                    tracing::debug!(turn_id = %turn.id(), ?outcome, "Committed turn");
                    let _ = self.events.send(SessionEvent::TurnUpserted(turn));
                }
                Effect::RemoveTurn(id) => {
                    if session.store.remove(id).is_some() {
                        let _ = self.events.send(SessionEvent::TurnRemoved(id));
                    }
                }
                Effect::AppendHistory {
                    role,
                    content,
                    turn,
                } => session.history.push(role, content, turn),
                Effect::RemoveHistory(id) => {
                    let removed = session.history.remove_turn(id);
                    tracing::debug!(turn_id = %id, removed, "Removed history entries");
                }
                Effect::ClearPendingInput => session.pending_input.clear(),
                Effect::RestorePendingInput(text) => session.pending_input = text,
                Effect::RaiseError(signal) => {
                    tracing::warn!(message = %signal.message, "Turn failed");
                    session.last_error = Some(signal.clone());
                    let _ = self.events.send(SessionEvent::Error(signal));
                }
                dispatch => dispatches.push(dispatch),
            }
        }
        dispatches
    }
}

/// Releases the in-flight flag when a turn settles, unless the session was
/// reset in the meantime
struct InFlightGuard<'a> {
    session: &'a Mutex<Session>,
    epoch: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut session = lock(self.session);
        if session.epoch == self.epoch {
            session.in_flight = false;
        }
    }
}

/// One turn's pipeline. The state lock serializes the stage-2 callbacks so
/// exactly one of them can perform the rollback.
struct TurnDriver<'a, C: TranslationClient> {
    orchestrator: &'a TurnOrchestrator<C>,
    epoch: u64,
    context: ConversationContext,
    state: Mutex<TurnState>,
}

impl<C: TranslationClient> TurnDriver<'_, C> {
    fn apply(&self, effects: Vec<Effect>) -> Vec<Effect> {
        self.orchestrator.apply_effects(self.epoch, effects)
    }

    /// Feed an outcome through the transition function and apply the result
    /// while still holding the turn's state lock
    fn advance(&self, event: Event) -> Vec<Effect> {
        let mut state = lock(&self.state);
        let event_name = event.name();
        match transition(&state, event) {
            Ok(result) => {
                tracing::debug!(
                    turn_id = %state.turn.id(),
                    from = state.phase.as_str(),
                    to = result.new_state.phase.as_str(),
                    event = event_name,
                    "Turn transition"
                );
                *state = result.new_state;
                self.apply(result.effects)
            }
            Err(e) => {
                tracing::error!(turn_id = %state.turn.id(), error = %e, "Rejected turn event");
                Vec::new()
            }
        }
    }

    fn tokens(&self, target: TranslationTarget) -> Vec<String> {
        lock(&self.state)
            .turn
            .tokens(target)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    async fn dispatch(&self, effect: Effect) -> Vec<Effect> {
        let client = &self.orchestrator.client;
        let languages = &self.context.languages;
        match effect {
            Effect::RequestTurn => {
                let history = lock(&self.orchestrator.session).history.messages();
                let started = Instant::now();
                let result = client.request_turn(&history).await;
                tracing::debug!(
                    stage = "turn",
                    duration_ms = %started.elapsed().as_millis(),
                    ok = result.is_ok(),
                    "Stage complete"
                );
                self.advance(Event::from_stage1(result))
            }
            Effect::RequestTranslations => {
                let (correction, reply) = tokio::join!(
                    self.translate(TranslationTarget::Correction),
                    self.translate(TranslationTarget::Reply),
                );
                correction.into_iter().chain(reply).collect()
            }
            Effect::RequestOpening => {
                let result = client
                    .translate_opening(&self.context.scenario, languages)
                    .await;
                self.advance(Event::from_opening(result))
            }
            Effect::RequestOpeningTranslation => self.translate(TranslationTarget::Reply).await,
            other => self.apply(vec![other]),
        }
    }

    async fn translate(&self, target: TranslationTarget) -> Vec<Effect> {
        let tokens = self.tokens(target);
        let started = Instant::now();
        let result = self
            .orchestrator
            .client
            .translate_array(&tokens, &self.context.languages)
            .await;
        tracing::debug!(
            stage = target.as_str(),
            duration_ms = %started.elapsed().as_millis(),
            ok = result.is_ok(),
            "Stage complete"
        );
        self.advance(Event::from_translation(target, result))
    }
}
