// src/services/gemini.rs
//! Client for the Gemini `generateContent` REST endpoint.
//!
//! The API key travels in the `x-goog-api-key` header and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::upstream::{GenerationRequest, TextGenerator, UpstreamError};
use crate::config::Config;
use crate::message::Role;

#[derive(Debug, Serialize)]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn build_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|turn| Content {
            role: role_name(turn.role),
            parts: [Part { text: &turn.text }],
        })
        .collect();

    contents.push(Content {
        role: "user",
        parts: [Part { text: &request.prompt }],
    });

    GenerateContentBody { contents }
}

// Finish reasons after which whatever text came back, even none, is the answer.
fn finished_normally(reason: Option<&str>) -> bool {
    matches!(reason, None | Some("STOP") | Some("MAX_TOKENS") | Some("FINISH_REASON_UNSPECIFIED"))
}

fn extract_text(response: GenerateContentResponse) -> Result<String, UpstreamError> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return match block_reason {
            Some(reason) => Err(UpstreamError::EmptyResponse { block_reason: Some(reason) }),
            None => Ok(String::new()),
        };
    };

    if !finished_normally(candidate.finish_reason.as_deref()) {
        return Err(UpstreamError::EmptyResponse {
            block_reason: candidate.finish_reason,
        });
    }

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default())
}

fn classify_status(status: StatusCode, body: String, model: &str) -> UpstreamError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::InvalidApiKey(body),
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") || body.contains("API key") => {
            UpstreamError::InvalidApiKey(body)
        }
        StatusCode::NOT_FOUND => UpstreamError::ModelNotFound {
            model: model.to_string(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::QuotaExceeded(body),
        _ => UpstreamError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: SecretString,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            api_base: api_base.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.model.clone(),
            config.upstream_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&build_body(request))
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        tracing::debug!(%status, model = %self.model, "gemini responded");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(%status, error = %err, "could not read upstream error body");
                    String::new()
                }
            };
            return Err(classify_status(status, body, &self.model));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(UpstreamError::Decode)?;
        extract_text(parsed)
    }
}
