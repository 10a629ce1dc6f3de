use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::prompt::PromptConfig;
use crate::llm::chat::{ ChatClient, Content, GenerationRequest, LlmError };
use crate::llm::GenerationSettings;
use crate::models::chat::{ HistoryEntry, Role };
use crate::models::relay::{ ErrorBody, RelayRequest, ReplyBody, ARCHIVE_FAILED, MESSAGE_REQUIRED };

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Message is required.")]
    Validation,
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        RelayError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Upstream(format!("unreadable request body: {}", err))
    }
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the caller sees. Upstream detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::Validation => MESSAGE_REQUIRED,
            RelayError::Upstream(_) => ARCHIVE_FAILED,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.public_message().to_string() };
        (self.status(), Json(body)).into_response()
    }
}

/// History turns in order, followed by the new user message.
pub fn compose_contents(history: &[HistoryEntry], message: &str) -> Vec<Content> {
    history
        .iter()
        .map(Content::from)
        .chain(std::iter::once(Content::text(Role::User, message)))
        .collect()
}

/// Forwards one chat turn to the generation service. Holds no per-request state.
pub struct Relay {
    chat_client: Arc<dyn ChatClient>,
    prompts: Arc<PromptConfig>,
    settings: GenerationSettings,
}

impl Relay {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompts: Arc<PromptConfig>,
        settings: GenerationSettings
    ) -> Self {
        Self { chat_client, prompts, settings }
    }

    pub async fn handle(&self, body: &[u8]) -> Result<ReplyBody, RelayError> {
        debug!("relay: received {} byte body", body.len());
        let value: Value = serde_json::from_slice(body)?;
        self.respond(RelayRequest::from_json(&value)).await
    }

    pub async fn respond(&self, request: RelayRequest) -> Result<ReplyBody, RelayError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(RelayError::Validation);
        }
        debug!("relay: validated message with {} history turns", request.history.len());

        let generation = GenerationRequest {
            system_instruction: self.prompts.system_instruction.clone(),
            contents: compose_contents(&request.history, message),
            settings: self.settings,
        };
        debug!(
            "relay: composed {} turns, awaiting {}",
            generation.contents.len(),
            self.chat_client.get_model()
        );

        let text = self.chat_client.generate(&generation).await?;
        debug!("relay: succeeded with {} chars", text.len());
        Ok(ReplyBody { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_appends_message_after_history() {
        let history = vec![
            HistoryEntry { role: Role::User, text: "hi".into() },
            HistoryEntry { role: Role::Model, text: "hello, reader".into() }
        ];

        let contents = compose_contents(&history, "Discuss the ending");

        assert_eq!(
            contents,
            vec![
                Content::text(Role::User, "hi"),
                Content::text(Role::Model, "hello, reader"),
                Content::text(Role::User, "Discuss the ending")
            ]
        );
    }

    #[test]
    fn compose_without_history_is_single_user_turn() {
        assert_eq!(compose_contents(&[], "What if"), vec![Content::text(Role::User, "What if")]);
    }

    #[test]
    fn errors_map_to_public_contract() {
        assert_eq!(RelayError::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::Validation.public_message(), "Message is required.");

        let upstream = RelayError::from(LlmError::Status { status: 503, body: "overloaded".into() });
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.public_message(), "The archive failed to respond.");
        assert!(upstream.to_string().contains("overloaded"));
    }
}
