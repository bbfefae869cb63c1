//! Custom Server Client
//!
//! HTTP client for the suggestion server:
//! - `POST {base}/api/suggest`  -> `{"suggestion": "..."}`
//! - `POST {base}/api/autofill` -> `{"autofillData": {...} | "{...}"}`

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ProviderError;
use crate::parser;
use crate::providers::local::AbortSignal;
use crate::providers::{
    AiProvider, AutofillRequest, FieldValues, ProgressCallback, ProviderDescriptor, ProviderKind,
    SuggestionRequest,
};

pub const SUGGEST_PATH: &str = "/api/suggest";
pub const AUTOFILL_PATH: &str = "/api/autofill";

/// Client for the custom suggestion server
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    headers: BTreeMap<String, String>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: None,
            headers: BTreeMap::new(),
        }
    }

    /// Build from a descriptor, falling back to the configured API URL
    pub fn from_descriptor(descriptor: &ProviderDescriptor, default_url: &str, timeout: Duration) -> Self {
        let base_url = descriptor.base_url.as_deref().unwrap_or(default_url);
        let mut client = Self::new(base_url, timeout);
        client.api_key = descriptor.api_key.clone();
        client.headers = descriptor.headers.clone();
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body; non-2xx is a provider failure
    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, ProviderError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Remote request");

        let mut request = self.http.post(&url).json(body);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::status(status.as_u16(), body));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| ProviderError::invalid_response(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl AiProvider for RemoteClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CustomServer
    }

    fn name(&self) -> &str {
        "Custom Server"
    }

    async fn suggest(
        &self,
        request: &SuggestionRequest,
        _prompt: &str,
        _abort: &AbortSignal,
    ) -> Result<String, ProviderError> {
        let body = self.post_json(SUGGEST_PATH, request).await?;

        body.get("suggestion")
            .and_then(Value::as_str)
            .or_else(|| body.get("autofillData").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| ProviderError::empty("Response has no suggestion"))
    }

    async fn autofill(
        &self,
        request: &AutofillRequest,
        _prompt: &str,
        _progress: Option<ProgressCallback>,
        _abort: &AbortSignal,
    ) -> Result<FieldValues, ProviderError> {
        let mut body = self.post_json(AUTOFILL_PATH, request).await?;
        let payload = body
            .get_mut("autofillData")
            .map(Value::take)
            .unwrap_or(Value::Null);
        parser::normalize_autofill_payload(payload)
    }
}
