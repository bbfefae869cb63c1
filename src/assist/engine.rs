//! Suggestion and Autofill Engine
//!
//! Builds prompts, resolves the execution order, and runs the cascade.
//! Never fails: no answer is `None` for suggestions and a placeholder mapping
//! for autofill.

use parking_lot::RwLock;
use std::sync::Arc;

use super::cascade::CascadeExecutor;
use super::prompts;
use crate::config::AssistConfig;
use crate::providers::local::{AvailabilityStatus, DownloadMonitor, LocalModel, LocalModelClient};
use crate::providers::{
    resolve_execution_order, AiProvider, AutofillRequest, FieldValues, FormContext,
    ProgressCallback, ProviderDescriptor, ProviderKind, ProviderRegistry, SuggestionRequest,
};

/// Value given to every field when AI is switched off
pub const AI_DISABLED_MARKER: &str = "[AI disabled]";

/// Prefix of synthetic values used when every provider failed
pub const PLACEHOLDER_PREFIX: &str = "sample_";

/// Synthetic value for a field nobody could fill
pub fn fallback_placeholder(field: &str) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, field)
}

/// Recover the field name from a synthetic value
pub fn placeholder_field(value: &str) -> Option<&str> {
    value.strip_prefix(PLACEHOLDER_PREFIX)
}

fn disabled_values(fields: &[String]) -> FieldValues {
    fields
        .iter()
        .map(|f| (f.clone(), serde_json::Value::from(AI_DISABLED_MARKER)))
        .collect()
}

fn fallback_values(fields: &[String]) -> FieldValues {
    fields
        .iter()
        .map(|f| (f.clone(), serde_json::Value::from(fallback_placeholder(f))))
        .collect()
}

/// Keep exactly the requested fields; fill gaps with placeholders
fn cover_requested(fields: &[String], mut values: FieldValues) -> FieldValues {
    fields
        .iter()
        .map(|f| {
            let value = values
                .remove(f)
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| serde_json::Value::from(fallback_placeholder(f)));
            (f.clone(), value)
        })
        .collect()
}

/// Builder for AssistEngine
pub struct AssistEngineBuilder {
    config: AssistConfig,
    local_model: Option<Arc<dyn LocalModel>>,
    extra_providers: Vec<Arc<dyn AiProvider>>,
}

impl AssistEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: AssistConfig::default(),
            local_model: None,
            extra_providers: Vec::new(),
        }
    }

    pub fn config(mut self, config: AssistConfig) -> Self {
        self.config = config;
        self
    }

    /// Plug in the host's in-process model; without one the local provider is unavailable
    pub fn local_model(mut self, model: Arc<dyn LocalModel>) -> Self {
        self.local_model = Some(model);
        self
    }

    /// Register a provider directly, overriding the one built from descriptors
    pub fn provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    pub fn build(self) -> AssistEngine {
        let downloads = DownloadMonitor::new();
        let local = LocalModelClient::new(self.local_model, downloads.clone(), self.config.request_timeout());

        let engine = AssistEngine {
            config: RwLock::new(self.config),
            registry: RwLock::new(ProviderRegistry::new()),
            order: RwLock::new(Vec::new()),
            extra_providers: self.extra_providers,
            local,
            downloads,
        };
        engine.rebuild();
        engine
    }
}

impl Default for AssistEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AssistEngine {
    config: RwLock<AssistConfig>,
    registry: RwLock<ProviderRegistry>,
    order: RwLock<Vec<ProviderKind>>,
    extra_providers: Vec<Arc<dyn AiProvider>>,
    local: LocalModelClient,
    downloads: DownloadMonitor,
}

impl AssistEngine {
    pub fn builder() -> AssistEngineBuilder {
        AssistEngineBuilder::new()
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> AssistConfig {
        self.config.read().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.config.write().enabled = enabled;
        tracing::info!(enabled, "AI assistance toggled");
    }

    pub fn execution_order(&self) -> Vec<ProviderKind> {
        self.order.read().clone()
    }

    /// Replace the provider set; rebuilds clients and the execution order
    pub fn set_providers(&self, providers: Vec<ProviderDescriptor>) {
        self.config.write().providers = providers;
        self.rebuild();
    }

    /// Replace the explicit order; an empty order falls back to priorities
    pub fn set_execution_order(&self, order: Vec<ProviderKind>) {
        self.config.write().execution_order = order;
        self.rebuild();
    }

    fn rebuild(&self) {
        let config = self.config.read().clone();

        let mut registry = ProviderRegistry::from_descriptors(
            &config.providers,
            &config.api_url,
            config.request_timeout(),
            &self.local,
        );
        for provider in &self.extra_providers {
            registry.register(provider.clone());
        }

        let order = resolve_execution_order(&config.providers, Some(config.execution_order.as_slice()));
        tracing::info!(order = ?order, providers = registry.len(), "Provider set updated");

        *self.registry.write() = registry;
        *self.order.write() = order;
    }

    fn cascade(&self) -> CascadeExecutor {
        CascadeExecutor::new(self.registry.read().clone())
    }

    /// Latest local model download progress; `None` when no download is active
    pub fn download_progress(&self) -> Option<f64> {
        self.downloads.current()
    }

    /// Probe the local model; never fails
    pub async fn check_availability(&self) -> AvailabilityStatus {
        self.local.check_availability().await
    }

    /// Suggest a value for one field
    ///
    /// `None` is a normal outcome: AI is off, or no provider had an answer.
    pub async fn suggest_value(
        &self,
        field_name: &str,
        current_value: &str,
        form_context: FormContext,
    ) -> Option<String> {
        if !self.is_enabled() {
            tracing::debug!(field = field_name, "AI disabled, no suggestion");
            return None;
        }

        let prompt = prompts::suggestion_prompt(field_name, current_value, &form_context);
        let request = SuggestionRequest {
            field_name: field_name.to_string(),
            current_value: current_value.to_string(),
            form_context,
        };

        let order = self.execution_order();
        self.cascade()
            .suggest(&order, &request, &prompt)
            .await
            .map(|(_, text)| text)
    }

    /// Produce a value for every requested field
    ///
    /// Always covers exactly `fields`: provider answers are trimmed to the
    /// requested keys, and gaps or total failure get synthetic placeholders.
    pub async fn autofill(
        &self,
        fields: &[String],
        form_context: FormContext,
        on_progress: Option<ProgressCallback>,
    ) -> FieldValues {
        if !self.is_enabled() {
            tracing::debug!(fields = fields.len(), "AI disabled, returning marker values");
            return disabled_values(fields);
        }
        if fields.is_empty() {
            return FieldValues::new();
        }

        let prompt = prompts::autofill_prompt(fields, &form_context);
        let request = AutofillRequest {
            fields: fields.to_vec(),
            form_context,
        };

        let order = self.execution_order();
        match self.cascade().autofill(&order, &request, &prompt, on_progress).await {
            Some((_, values)) => cover_requested(fields, values),
            None => {
                tracing::warn!(fields = fields.len(), "All providers failed, using placeholder values");
                fallback_values(fields)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_round_trip() {
        for field in ["name", "email", "sample_field", ""] {
            let value = fallback_placeholder(field);
            assert_eq!(placeholder_field(&value), Some(field));
        }
        assert_eq!(placeholder_field("Alice"), None);
    }

    #[test]
    fn test_cover_requested_trims_and_fills() {
        let fields = vec!["name".to_string(), "email".to_string()];
        let mut values = FieldValues::new();
        values.insert("name".into(), json!("Ada"));
        values.insert("extra".into(), json!("ignored"));

        let covered = cover_requested(&fields, values);
        assert_eq!(covered.len(), 2);
        assert_eq!(covered["name"], json!("Ada"));
        assert_eq!(covered["email"], json!("sample_email"));
    }

    #[test]
    fn test_null_values_become_placeholders() {
        let fields = vec!["city".to_string()];
        let mut values = FieldValues::new();
        values.insert("city".into(), serde_json::Value::Null);
        assert_eq!(cover_requested(&fields, values)["city"], json!("sample_city"));
    }
}
