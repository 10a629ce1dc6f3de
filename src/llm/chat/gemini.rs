use async_trait::async_trait;
use log::{ debug, info };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, Content, GenerationRequest, LlmError, Part };
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL };

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: SystemInstruction,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize, Debug)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

#[derive(Deserialize, Debug)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize, Debug)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_payload(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: &request.contents,
        system_instruction: SystemInstruction {
            parts: vec![Part { text: request.system_instruction.clone() }],
        },
        generation_config: GenerationConfig {
            temperature: request.settings.temperature,
            max_output_tokens: request.settings.max_output_tokens,
        },
    }
}

/// Joins the text parts of the first candidate; no candidate means no text.
fn extract_text(response: &GoogleResponse) -> String {
    response.candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let chat_model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: chat_model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = self.endpoint();
        info!(
            "GeminiChatClient::generate() → model={} turns={}",
            self.model,
            request.contents.len()
        );

        let response = self.http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&build_payload(request))
            .send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text().await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed: GoogleResponse = response.json().await?;
        let text = extract_text(&parsed);
        debug!("GeminiChatClient::generate() ← {} chars", text.len());
        Ok(text)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
