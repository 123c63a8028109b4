//! Typed decoding of the JSON objects the model answers with

use crate::conversation::WordTranslations;
use crate::llm::{JsonObject, LlmError};
use serde::Deserialize;
use serde_json::Value;

/// Stage-1 answer: corrected sentence and reply, each word by word
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TurnReply {
    #[serde(default)]
    pub split: Option<Vec<String>>,
    pub corrected: Vec<String>,
    pub reply: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpeningTranslation {
    translation: Vec<String>,
}

/// The model may refuse with `{"error": "..."}` instead of the requested shape.
fn reported_error(object: &JsonObject) -> Option<LlmError> {
    match object.get("error")? {
        Value::String(message) => Some(LlmError::api_reported(message.clone())),
        Value::Null => None,
        other => Some(LlmError::api_reported(other.to_string())),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(object: JsonObject, what: &str) -> Result<T, LlmError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| LlmError::malformed_payload(format!("Invalid {what}: {e}")))
}

/// Decode a shape whose keys are fixed, so `error` can only mean a refusal
fn decode_keyed<T: for<'de> Deserialize<'de>>(object: JsonObject, what: &str) -> Result<T, LlmError> {
    if let Some(error) = reported_error(&object) {
        return Err(error);
    }
    decode(object, what)
}

pub fn decode_turn_reply(object: JsonObject) -> Result<TurnReply, LlmError> {
    decode_keyed(object, "turn response")
}

pub fn decode_opening(object: JsonObject) -> Result<Vec<String>, LlmError> {
    decode_keyed::<OpeningTranslation>(object, "opening translation").map(|o| o.translation)
}

/// Word maps are keyed by the words themselves, and "error" is an ordinary
/// word in several languages. Only a lone `error` key for a sentence that
/// did not contain that word is a refusal.
pub fn decode_word_translations(
    object: JsonObject,
    tokens: &[String],
) -> Result<WordTranslations, LlmError> {
    if object.len() == 1 && !tokens.iter().any(|t| t == "error") {
        if let Some(error) = reported_error(&object) {
            return Err(error);
        }
    }
    decode(object, "word translations")
}
