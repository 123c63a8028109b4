//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Transport, message)
    }

    pub fn empty_body() -> Self {
        Self::new(LlmErrorKind::EmptyResponseBody, "Response body was empty")
    }

    pub fn malformed_envelope(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedEnvelope, message)
    }

    pub fn api_reported(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ApiReported, message)
    }

    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedPayload, message)
    }

    /// Human-readable line for the error signal
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind.label(), self.message)
    }
}

/// Failure classification. Every call site maps its failure to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection, timeout, or body read failure
    Transport,
    /// Server answered with no body at all
    EmptyResponseBody,
    /// Outer JSON envelope could not be parsed or has the wrong structure
    MalformedEnvelope,
    /// The API (or the model itself) reported an error message
    ApiReported,
    /// Inner JSON decoded but required keys are missing or mistyped
    MalformedPayload,
}

impl LlmErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Transport => "transport failure",
            Self::EmptyResponseBody => "empty response",
            Self::MalformedEnvelope => "malformed response",
            Self::ApiReported => "api error",
            Self::MalformedPayload => "unexpected response content",
        }
    }
}
