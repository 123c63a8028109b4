//! Outcomes of remote calls that drive a turn forward

use crate::conversation::{TranslationTarget, WordTranslations};
use crate::llm::LlmError;
use crate::translation::TurnReply;

#[derive(Debug, Clone)]
pub enum Event {
    // Opening turn
    OpeningReceived {
        reply: Vec<String>,
    },
    OpeningFailed {
        error: LlmError,
    },

    // Stage 1: correction + reply
    Stage1Received {
        reply: TurnReply,
    },
    Stage1Failed {
        error: LlmError,
    },

    // Stage 2 (and the opening turn's reply translation)
    TranslationReceived {
        target: TranslationTarget,
        translations: WordTranslations,
    },
    TranslationFailed {
        target: TranslationTarget,
        error: LlmError,
    },
}

impl Event {
    pub fn from_opening(result: Result<Vec<String>, LlmError>) -> Self {
        match result {
            Ok(reply) => Event::OpeningReceived { reply },
            Err(error) => Event::OpeningFailed { error },
        }
    }

    pub fn from_stage1(result: Result<TurnReply, LlmError>) -> Self {
        match result {
            Ok(reply) => Event::Stage1Received { reply },
            Err(error) => Event::Stage1Failed { error },
        }
    }

    pub fn from_translation(
        target: TranslationTarget,
        result: Result<WordTranslations, LlmError>,
    ) -> Self {
        match result {
            Ok(translations) => Event::TranslationReceived {
                target,
                translations,
            },
            Err(error) => Event::TranslationFailed { target, error },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::OpeningReceived { .. } => "opening_received",
            Event::OpeningFailed { .. } => "opening_failed",
            Event::Stage1Received { .. } => "stage1_received",
            Event::Stage1Failed { .. } => "stage1_failed",
            Event::TranslationReceived { .. } => "translation_received",
            Event::TranslationFailed { .. } => "translation_failed",
        }
    }
}
