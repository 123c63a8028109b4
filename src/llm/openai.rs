//! `OpenAI`-compatible chat completions in JSON-object mode

use super::types::{ChatRequest, JsonObject};
use super::{ChatService, LlmError};
use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
    temperature: f32,
}

impl OpenAIService {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.clone(),
            model_id: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn translate_request<'a>(&'a self, request: &'a ChatRequest) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model_id,
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature.unwrap_or(self.temperature),
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        }
    }
}

#[async_trait]
impl ChatService for OpenAIService {
    async fn complete(&self, request: &ChatRequest) -> Result<JsonObject, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::transport(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::transport(format!("Connection failed: {e}"))
                } else {
                    LlmError::transport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::transport(format!("Failed to read response: {e}")))?;

        decode_envelope(status.as_u16(), &body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Classify a raw HTTP answer into the inner JSON object or exactly one failure kind.
pub(crate) fn decode_envelope(status: u16, body: &str) -> Result<JsonObject, LlmError> {
    if body.trim().is_empty() {
        return Err(LlmError::empty_body());
    }

    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::malformed_envelope(format!("Failed to parse response: {e}")))?;
    let Value::Object(envelope) = envelope else {
        return Err(LlmError::malformed_envelope("Response is not a JSON object"));
    };

    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .or_else(|| error.get("content"))
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(LlmError::api_reported(message));
    }

    if !(200..300).contains(&status) {
        return Err(LlmError::api_reported(format!("HTTP {status}")));
    }

    let response: OpenAIResponse = serde_json::from_value(Value::Object(envelope))
        .map_err(|e| LlmError::malformed_envelope(format!("Unexpected response structure: {e}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::malformed_envelope("No message content in response"))?;

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(LlmError::malformed_envelope(
            "Message content is not a JSON object",
        )),
        Err(e) => Err(LlmError::malformed_envelope(format!(
            "Message content is not valid JSON: {e}"
        ))),
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}
