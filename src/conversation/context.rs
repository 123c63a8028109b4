//! Scenarios and the per-session conversation context

use serde::{Deserialize, Serialize};

/// Language the user is learning and the language they are fluent in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub target: String,
    pub starting: String,
}

impl LanguagePair {
    pub fn new(target: impl Into<String>, starting: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            starting: starting.into(),
        }
    }
}

/// A roleplay setting the user can pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub description: String,
    /// First line of the conversation, written in English
    pub opening_line: String,
}

impl Scenario {
    pub fn new(description: impl Into<String>, opening_line: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            opening_line: opening_line.into(),
        }
    }

    /// Scenarios shipped with the app
    pub fn builtin() -> Vec<Scenario> {
        vec![
            Scenario::new(
                "You are sending a message to your landlord to talk about a problem in your \
                 apartment. You will be the tenant, the AI will be the landlord.",
                "Hello! You mentioned the other day that something is wrong with the \
                 apartment, what's going on?",
            ),
            Scenario::new(
                "While on the way to work or school, you see an old lady giving some nuts to \
                 a squirrel. You are the commuter, the AI will be the old lady.",
                "I'm sorry, can you help me open this bag of nuts? I'm going to give them to \
                 this squirrel.",
            ),
        ]
    }
}

/// Immutable for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    pub scenario: Scenario,
    pub languages: LanguagePair,
}

impl ConversationContext {
    pub fn new(scenario: Scenario, languages: LanguagePair) -> Self {
        Self {
            scenario,
            languages,
        }
    }
}
