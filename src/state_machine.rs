//! Per-turn pipeline state machine
//!
//! Pure transitions in the Elm style: `(state, event) -> (state, effects)`.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, ErrorSignal};
pub use event::Event;
pub use state::{TurnPhase, TurnState};
pub use transition::{start_opening, start_turn, transition, TransitionError, TransitionResult};
