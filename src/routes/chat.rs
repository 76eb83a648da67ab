use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, HealthResponse},
    services::{
        chatbot::{generate_reply, validate_message},
        upstream::{GenerationRequest, TextGenerator},
    },
    state::SharedState,
};

#[tracing::instrument(name = "chat", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "unreadable chat body");
        AppError::BadRequest(rejection.body_text())
    })?;

    tracing::info!(history_turns = payload.history.len(), "chat request received");

    let Some(message) = validate_message(payload.message.as_deref()) else {
        tracing::warn!("rejecting chat request without a message");
        return Err(AppError::BadRequest("Message is required".to_string()));
    };

    let response = generate_reply(
        state.generator.as_ref(),
        message,
        payload.history,
        state.history_enabled,
    )
    .await?;

    Ok(Json(ChatResponse { response }))
}

// Single-shot endpoint kept for older front ends: `{prompt}` in, `{text}` out.
#[tracing::instrument(name = "generate", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let Some(prompt) = validate_message(payload.prompt.as_deref()) else {
        return Err(AppError::BadRequest("Prompt is required".to_string()));
    };

    tracing::info!("generate request received");
    let text = state
        .generator
        .generate(&GenerationRequest::new(prompt))
        .await
        .map_err(|err| {
            tracing::error!(kind = err.kind(), hint = err.hint(), detail = %err.detail(), "generate failed");
            AppError::Generate(err)
        })?;

    Ok(Json(GenerateResponse { text }))
}

// Liveness probe; must not touch the upstream.
pub async fn test_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        api_key_set: state.api_key_set,
    })
}
