// src/services/upstream.rs
use async_trait::async_trait;
use thiserror::Error;

use crate::message::HistoryTurn;

/// What the relay hands to the model: prior turns, then the new prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub history: Vec<HistoryTurn>,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            prompt: prompt.into(),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream rejected the API key: {0}")]
    InvalidApiKey(String),
    #[error("model {model:?} is not available: {body}")]
    ModelNotFound { model: String, body: String },
    #[error("upstream quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request to upstream failed")]
    Transport(#[source] reqwest::Error),
    #[error("could not decode upstream response")]
    Decode(#[source] reqwest::Error),
    #[error("upstream returned no text{}", block_suffix(.block_reason))]
    EmptyResponse { block_reason: Option<String> },
    #[error("{0}")]
    Other(String),
}

fn block_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" (blocked: {r})"))
        .unwrap_or_default()
}

impl UpstreamError {
    /// Short failure category for operator logs.
    pub fn hint(&self) -> &'static str {
        match self {
            UpstreamError::InvalidApiKey(_) => "invalid key: check GEMINI_API_KEY",
            UpstreamError::ModelNotFound { .. } => "model issue: check GEMINI_MODEL",
            UpstreamError::QuotaExceeded(_) => "quota: rate limit or billing quota reached",
            UpstreamError::Status { status, .. } if *status >= 500 => "upstream outage",
            UpstreamError::Status { .. } => "rejected request",
            UpstreamError::Transport(_) => "network: upstream unreachable",
            UpstreamError::Decode(_) => "unexpected response format",
            UpstreamError::EmptyResponse { .. } => "empty response: possibly blocked by safety filters",
            UpstreamError::Other(_) => "unknown",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::InvalidApiKey(_) => "InvalidApiKey",
            UpstreamError::ModelNotFound { .. } => "ModelNotFound",
            UpstreamError::QuotaExceeded(_) => "QuotaExceeded",
            UpstreamError::Status { .. } => "Status",
            UpstreamError::Transport(_) => "Transport",
            UpstreamError::Decode(_) => "Decode",
            UpstreamError::EmptyResponse { .. } => "EmptyResponse",
            UpstreamError::Other(_) => "Other",
        }
    }

    /// Full error chain, `: `-separated.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

/// The text-generation capability the relay depends on.
///
/// Production uses [`super::gemini::GeminiClient`]; tests plug in doubles.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_name_the_failure_category() {
        assert!(UpstreamError::InvalidApiKey(String::new()).hint().starts_with("invalid key"));
        assert!(
            UpstreamError::ModelNotFound { model: "x".into(), body: String::new() }
                .hint()
                .starts_with("model issue")
        );
        assert!(UpstreamError::QuotaExceeded(String::new()).hint().starts_with("quota"));
    }

    #[test]
    fn empty_response_mentions_block_reason() {
        let err = UpstreamError::EmptyResponse { block_reason: Some("SAFETY".into()) };
        assert_eq!(err.to_string(), "upstream returned no text (blocked: SAFETY)");
        let err = UpstreamError::EmptyResponse { block_reason: None };
        assert_eq!(err.to_string(), "upstream returned no text");
    }
}
