//! Turn records: one user/assistant exchange with progressively filled fields

use crate::alignment::tokenize;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Token → translation, keyed by the literal token text.
///
/// A sentence that repeats a word with two senses collides on one key; the
/// last translation received wins.
pub type WordTranslations = HashMap<String, String>;

/// Stable identity of a turn. Fresh for every turn, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId(Uuid);

impl TurnId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which token sequence of a turn a word translation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationTarget {
    /// The corrected user sentence
    Correction,
    /// The assistant reply
    Reply,
}

impl TranslationTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            TranslationTarget::Correction => "correction",
            TranslationTarget::Reply => "reply",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    id: TurnId,
    /// Absent for the system-initiated opening turn
    pub user_message: Option<String>,
    pub split_user_message: Option<Vec<String>>,
    pub corrected_user_message: Option<Vec<String>>,
    pub corrected_user_message_translation: Option<WordTranslations>,
    pub reply: Option<Vec<String>>,
    pub reply_translation: Option<WordTranslations>,
}

impl Turn {
    fn empty(user_message: Option<String>) -> Self {
        Self {
            id: TurnId::new(),
            user_message,
            split_user_message: None,
            corrected_user_message: None,
            corrected_user_message_translation: None,
            reply: None,
            reply_translation: None,
        }
    }

    /// The opening turn of a session, before the model has said anything
    pub fn opening() -> Self {
        Self::empty(None)
    }

    pub fn from_user(text: impl Into<String>) -> Self {
        Self::empty(Some(text.into()))
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn is_opening(&self) -> bool {
        self.user_message.is_none()
    }

    /// Reply tokens joined back into a sentence
    pub fn display_reply(&self) -> Option<String> {
        self.reply.as_ref().map(|tokens| tokens.join(" "))
    }

    pub fn display_corrected(&self) -> Option<String> {
        self.corrected_user_message
            .as_ref()
            .map(|tokens| tokens.join(" "))
    }

    /// Tokens of the user's own sentence: the model's split when it sent one,
    /// otherwise a whitespace split of the raw text.
    pub fn original_tokens(&self) -> Vec<String> {
        match (&self.split_user_message, &self.user_message) {
            (Some(split), _) => split.clone(),
            (None, Some(text)) => tokenize(text),
            (None, None) => Vec::new(),
        }
    }

    pub fn tokens(&self, target: TranslationTarget) -> Option<&[String]> {
        match target {
            TranslationTarget::Correction => self.corrected_user_message.as_deref(),
            TranslationTarget::Reply => self.reply.as_deref(),
        }
    }

    pub fn translations(&self, target: TranslationTarget) -> Option<&WordTranslations> {
        match target {
            TranslationTarget::Correction => self.corrected_user_message_translation.as_ref(),
            TranslationTarget::Reply => self.reply_translation.as_ref(),
        }
    }

    pub fn set_translations(&mut self, target: TranslationTarget, translations: WordTranslations) {
        match target {
            TranslationTarget::Correction => {
                self.corrected_user_message_translation = Some(translations);
            }
            TranslationTarget::Reply => self.reply_translation = Some(translations),
        }
    }

    /// Translation of the token at `index` in the given sequence
    pub fn translation_at(&self, target: TranslationTarget, index: usize) -> Option<&str> {
        let token = self.tokens(target)?.get(index)?;
        self.translations(target)?.get(token).map(String::as_str)
    }

    /// Index-aligned view of a translation map, parallel to the token sequence
    pub fn aligned_translations(&self, target: TranslationTarget) -> Vec<Option<&str>> {
        let Some(tokens) = self.tokens(target) else {
            return Vec::new();
        };
        let translations = self.translations(target);
        tokens
            .iter()
            .map(|token| {
                translations
                    .and_then(|map| map.get(token))
                    .map(String::as_str)
            })
            .collect()
    }
}
