//! Provider Abstraction Layer
//!
//! Defines the AiProvider trait and supporting types for both the in-process
//! model and the remote backends.

pub mod cloud;
pub mod local;
mod registry;
mod resolver;

pub use registry::ProviderRegistry;
pub use resolver::resolve_execution_order;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ProviderError;
use local::AbortSignal;

/// Snapshot of every field's current value, keyed by field name
pub type FormContext = BTreeMap<String, serde_json::Value>;

/// Autofill result, keyed by field name
pub type FieldValues = BTreeMap<String, serde_json::Value>;

/// Download progress observer, receives 0-100 (fractional allowed)
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Closed set of provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// In-process language model, possibly absent
    #[serde(rename = "local")]
    LocalModel,
    /// Custom HTTP suggestion server (`/api/suggest`, `/api/autofill`)
    #[serde(rename = "custom-server")]
    CustomServer,
    /// OpenAI-compatible chat completions endpoint
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::LocalModel => "local",
            ProviderKind::CustomServer => "custom-server",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "local-model" => Some(ProviderKind::LocalModel),
            "custom-server" | "custom" | "server" => Some(ProviderKind::CustomServer),
            "openai" => Some(ProviderKind::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied description of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Higher runs first
    #[serde(default)]
    pub priority: i32,
    /// Overrides the configured API URL for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderDescriptor {
    pub fn new(kind: ProviderKind, priority: i32) -> Self {
        Self {
            kind,
            enabled: true,
            priority,
            base_url: None,
            api_key: None,
            headers: BTreeMap::new(),
            model: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// One suggestion request; also the `/api/suggest` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub field_name: String,
    pub current_value: String,
    pub form_context: FormContext,
}

/// One autofill request; also the `/api/autofill` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillRequest {
    pub fields: Vec<String>,
    pub form_context: FormContext,
}

/// The uniform capability every backend implements
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Provider name for logging/display
    fn name(&self) -> &str;

    /// Produce raw suggestion text for one field
    async fn suggest(
        &self,
        request: &SuggestionRequest,
        prompt: &str,
        abort: &AbortSignal,
    ) -> Result<String, ProviderError>;

    /// Produce a JSON object of field values
    ///
    /// The result may hold extra or missing keys; the engine normalizes it.
    async fn autofill(
        &self,
        request: &AutofillRequest,
        prompt: &str,
        progress: Option<ProgressCallback>,
        abort: &AbortSignal,
    ) -> Result<FieldValues, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults_from_json() {
        let d: ProviderDescriptor = serde_json::from_str(r#"{"type": "openai"}"#).unwrap();
        assert_eq!(d.kind, ProviderKind::OpenAi);
        assert!(d.enabled);
        assert_eq!(d.priority, 0);
        assert!(d.headers.is_empty());
    }

    #[test]
    fn test_descriptor_camel_case_fields() {
        let d: ProviderDescriptor = serde_json::from_str(
            r#"{"type": "custom-server", "priority": 5, "baseUrl": "http://x", "apiKey": "k"}"#,
        )
        .unwrap();
        assert_eq!(d.kind, ProviderKind::CustomServer);
        assert_eq!(d.base_url.as_deref(), Some("http://x"));
        assert_eq!(d.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_suggestion_request_body_shape() {
        let mut ctx = FormContext::new();
        ctx.insert("name".into(), serde_json::json!("Ada"));
        let req = SuggestionRequest {
            field_name: "email".into(),
            current_value: "foo@".into(),
            form_context: ctx,
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["fieldName"], "email");
        assert_eq!(body["currentValue"], "foo@");
        assert_eq!(body["formContext"]["name"], "Ada");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ProviderKind::parse(" Local "), Some(ProviderKind::LocalModel));
        assert_eq!(ProviderKind::parse("custom-server"), Some(ProviderKind::CustomServer));
        assert_eq!(ProviderKind::parse("gemini"), None);
    }
}
