// src/services/chatbot.rs
use crate::message::HistoryTurn;
use crate::services::upstream::{GenerationRequest, TextGenerator, UpstreamError};

/// Returns the message as sent, or `None` when it is missing or blank.
pub fn validate_message(message: Option<&str>) -> Option<&str> {
    message.filter(|m| !m.trim().is_empty())
}

/// Forward one message to the model and wait for its text.
///
/// History is only passed on when `history_enabled` is set; otherwise the
/// model sees the message alone. One attempt, no retry.
pub async fn generate_reply(
    generator: &dyn TextGenerator,
    message: &str,
    history: Vec<HistoryTurn>,
    history_enabled: bool,
) -> Result<String, UpstreamError> {
    let mut request = GenerationRequest::new(message);
    if history_enabled {
        request = request.with_history(history);
    } else if !history.is_empty() {
        tracing::debug!(turns = history.len(), "history support disabled, dropping turns");
    }

    tracing::info!(turns = request.history.len(), "calling upstream model");
    match generator.generate(&request).await {
        Ok(text) => {
            tracing::info!("upstream responded");
            tracing::debug!(chars = text.chars().count(), "final text extracted");
            Ok(text)
        }
        Err(err) => {
            tracing::error!(
                kind = err.kind(),
                hint = err.hint(),
                detail = %err.detail(),
                "upstream call failed"
            );
            tracing::debug!(error = ?err, "upstream error debug dump");
            Err(err)
        }
    }
}
