//! Translation client: the three remote calls a turn pipeline makes
//!
//! The orchestrator only sees [`TranslationClient`]. [`LlmTranslationClient`]
//! implements it on top of any [`ChatService`] by building the prompts and
//! decoding the answers into typed payloads.

mod payload;
pub mod prompts;

pub use payload::TurnReply;

use crate::conversation::{LanguagePair, Scenario, WordTranslations};
use crate::llm::{ChatMessage, ChatRequest, ChatService, LlmError};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Stage 1: correct the latest user message and reply to it
    async fn request_turn(&self, history: &[ChatMessage]) -> Result<TurnReply, LlmError>;

    /// Stage 2: translate each token back into the starting language
    async fn translate_array(
        &self,
        tokens: &[String],
        languages: &LanguagePair,
    ) -> Result<WordTranslations, LlmError>;

    /// Translate the scenario's English opening line into the target language
    async fn translate_opening(
        &self,
        scenario: &Scenario,
        languages: &LanguagePair,
    ) -> Result<Vec<String>, LlmError>;
}

#[async_trait]
impl<T: TranslationClient + ?Sized> TranslationClient for Arc<T> {
    async fn request_turn(&self, history: &[ChatMessage]) -> Result<TurnReply, LlmError> {
        (**self).request_turn(history).await
    }

    async fn translate_array(
        &self,
        tokens: &[String],
        languages: &LanguagePair,
    ) -> Result<WordTranslations, LlmError> {
        (**self).translate_array(tokens, languages).await
    }

    async fn translate_opening(
        &self,
        scenario: &Scenario,
        languages: &LanguagePair,
    ) -> Result<Vec<String>, LlmError> {
        (**self).translate_opening(scenario, languages).await
    }
}

/// Adapter to use a chat completion service as the translation client
pub struct LlmTranslationClient {
    service: Arc<dyn ChatService>,
}

impl LlmTranslationClient {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TranslationClient for LlmTranslationClient {
    async fn request_turn(&self, history: &[ChatMessage]) -> Result<TurnReply, LlmError> {
        let request = ChatRequest::new(history.to_vec());
        let object = self.service.complete(&request).await?;
        payload::decode_turn_reply(object)
    }

    async fn translate_array(
        &self,
        tokens: &[String],
        languages: &LanguagePair,
    ) -> Result<WordTranslations, LlmError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(prompts::word_translation_system_prompt(languages)),
            ChatMessage::user(prompts::word_translation_user_prompt(tokens)),
        ]);
        let object = self.service.complete(&request).await?;
        payload::decode_word_translations(object, tokens)
    }

    async fn translate_opening(
        &self,
        scenario: &Scenario,
        languages: &LanguagePair,
    ) -> Result<Vec<String>, LlmError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(prompts::opening_system_prompt(languages)),
            ChatMessage::user(prompts::opening_user_prompt(scenario, languages)),
        ]);
        let object = self.service.complete(&request).await?;
        payload::decode_opening(object)
    }
}
