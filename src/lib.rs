//! Convee - conversational language tutor
//!
//! A turn pipeline that corrects the learner's sentence, replies in the
//! target language and back-translates every word, plus the word alignment
//! engine that lays those words out for lookup.

pub mod alignment;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod orchestrator;
pub mod preferences;
pub mod state_machine;
pub mod store;
pub mod translation;
