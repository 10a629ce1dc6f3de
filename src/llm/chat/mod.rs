pub mod gemini;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use self::gemini::GeminiChatClient;
use super::{ GenerationSettings, LlmConfig };
use crate::models::chat::{ HistoryEntry, Role };

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is required for the generation service")]
    MissingApiKey,
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Part {
    pub text: String,
}

/// One role-tagged turn in the shape the generation service expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self { role, parts: vec![Part { text: text.into() }] }
    }
}

impl From<&HistoryEntry> for Content {
    fn from(entry: &HistoryEntry) -> Self {
        Content::text(entry.role, entry.text.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub contents: Vec<Content>,
    pub settings: GenerationSettings,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single attempt; the returned text is empty when the service produced none.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = Arc::new(GeminiChatClient::from_config(config)?);
    Ok(client)
}
