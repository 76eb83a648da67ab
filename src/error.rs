// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorResponse;
use crate::services::upstream::UpstreamError;

/// Body sent for every upstream failure on `/api/chat`.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong. Please try again.";
/// Body sent for every upstream failure on `/generate`.
pub const GENERATE_FAILURE: &str = "Error generating response";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("generate failed: {0}")]
    Generate(#[source] UpstreamError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Upstream details are logged at the call site and never reach the client.
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string()),
            AppError::Generate(_) => (StatusCode::INTERNAL_SERVER_ERROR, GENERATE_FAILURE.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_is_verbatim() {
        let (status, body) = body_of(AppError::BadRequest("Message is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn upstream_detail_is_hidden() {
        let err = UpstreamError::InvalidApiKey("key AIza-secret rejected".into());
        let (status, body) = body_of(AppError::Upstream(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": GENERIC_FAILURE }));
    }

    #[tokio::test]
    async fn generate_failure_uses_its_own_message() {
        let err = UpstreamError::Other("boom".into());
        let (status, body) = body_of(AppError::Generate(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERATE_FAILURE);
    }
}
