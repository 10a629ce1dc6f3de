use async_trait::async_trait;
use std::sync::{ Arc, Mutex };

use crate::config::prompt::PromptConfig;
use crate::llm::chat::{ ChatClient, GenerationRequest, LlmError };
use crate::llm::GenerationSettings;
use crate::server::api::{ router, AppState };
use crate::server::relay::Relay;

/// Generation client that answers from a canned result and records every request.
pub struct MockChatClient {
    reply: Result<String, String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl MockChatClient {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.to_string()), calls: Mutex::new(Vec::new()) })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(reason.to_string()), calls: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(LlmError::Other)
    }

    fn get_model(&self) -> String {
        "mock".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

pub fn relay_app(client: Arc<MockChatClient>) -> axum::Router {
    let relay = Relay::new(client, Arc::new(PromptConfig::default()), GenerationSettings::default());
    router(AppState::new(Arc::new(relay)))
}
