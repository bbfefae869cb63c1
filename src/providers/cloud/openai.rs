//! OpenAI-Compatible Client
//!
//! Sends the engine's prompt to any Chat Completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ProviderError;
use crate::parser;
use crate::providers::local::AbortSignal;
use crate::providers::{
    AiProvider, AutofillRequest, FieldValues, ProgressCallback, ProviderDescriptor, ProviderKind,
    SuggestionRequest,
};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    headers: BTreeMap<String, String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key,
            model,
            headers: BTreeMap::new(),
        }
    }

    /// Build from a descriptor; `None` without credentials
    pub fn from_descriptor(descriptor: &ProviderDescriptor, timeout: Duration) -> Option<Self> {
        let api_key = descriptor.api_key.clone()?;
        let model = descriptor
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let mut client = Self::new(api_key, model, timeout);
        if let Some(url) = &descriptor.base_url {
            client.base_url = url.clone();
        }
        client.headers = descriptor.headers.clone();
        Some(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.2,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_PATH);
        tracing::debug!(url = %url, model = %self.model, "OpenAI-compatible request");

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::status(status.as_u16(), body));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("Failed to parse completion: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::empty("No choices returned"))
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn name(&self) -> &str {
        "OpenAI-compatible"
    }

    async fn suggest(
        &self,
        _request: &SuggestionRequest,
        prompt: &str,
        _abort: &AbortSignal,
    ) -> Result<String, ProviderError> {
        self.complete(prompt, false).await
    }

    async fn autofill(
        &self,
        _request: &AutofillRequest,
        prompt: &str,
        _progress: Option<ProgressCallback>,
        _abort: &AbortSignal,
    ) -> Result<FieldValues, ProviderError> {
        let text = self.complete(prompt, true).await?;
        parser::parse_object_from_text(&text)
    }
}

// -----------------------------------------------------------------------------
// Chat Completions DTOs
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}
