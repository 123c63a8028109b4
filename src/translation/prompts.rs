//! Prompt construction for the three kinds of model calls

use crate::conversation::{LanguagePair, Scenario};
use serde_json::Value;

/// System prompt that opens every roleplay session
pub fn roleplay_system_prompt(scenario: &Scenario, languages: &LanguagePair) -> String {
    let LanguagePair { target, starting } = languages;
    let description = &scenario.description;
    format!(
        r#"You are a {target} language coach doing roleplay with me. The context is: {description}. I will try to talk to you in {target} and you will be replying in {target}. I will put words that I don't know in {starting} in my part of the roleplay. You will answer with a JSON object containing these arrays:
"split": my message, split word by word
"corrected": my message, corrected by you retaining the meaning but fixing mistakes or translating missing words, word by word
"reply": your response to the message, in {target}, word by word
Continue the conversation given the context and keep it short and natural, one to two sentences maximum, using a spoken style that fits the setting. Your reply should always require an answer from me, unless I clearly want to close the conversation. Do not stray from the context. Do not answer questions that do not fit the language coaching context. If my message is not part of the roleplay or makes no sense in the context, answer only with {{"error": "conversation strayed from context"}}"#
    )
}

/// System prompt for translating the English opening line into the target language
pub fn opening_system_prompt(languages: &LanguagePair) -> String {
    let target = &languages.target;
    format!(
        r#"You are a helpful assistant making accurate translations from English to {target}. You will answer with a JSON object of the form {{"translation": [...]}} where the array holds the {target} translation of the message you are given, word by word."#
    )
}

pub fn opening_user_prompt(scenario: &Scenario, languages: &LanguagePair) -> String {
    format!(
        "Translate this sentence: \"{}\" into {}. It is the first sentence of a conversation in this context: {}.",
        scenario.opening_line, languages.target, scenario.description
    )
}

/// System prompt for word-by-word back translation
pub fn word_translation_system_prompt(languages: &LanguagePair) -> String {
    let LanguagePair { target, starting } = languages;
    format!(
        r#"You are a helpful assistant making accurate translations from {target} to {starting}. You will answer with a JSON object mapping each of the {target} words you are given to its {starting} translation. Give a translation for every single word. Keep each translation accurate to the sentence the words form when read in order: for every word answer "{target} word": "{starting} translation"."#
    )
}

/// The words go out as a JSON array so the model echoes them back verbatim
/// as keys of its answer.
pub fn word_translation_user_prompt(tokens: &[String]) -> String {
    let quoted: Vec<String> = tokens
        .iter()
        .map(|t| Value::String(t.clone()).to_string())
        .collect();
    format!(
        "Translate this sentence given as a list of words: [{}]",
        quoted.join(", ")
    )
}
