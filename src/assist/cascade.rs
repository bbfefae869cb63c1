//! Cascade Executor
//!
//! Walks the execution order one provider at a time:
//! - the first usable answer wins, later providers are never called
//! - unavailable or unregistered providers are skipped silently
//! - failures are logged and the next provider is tried
//!
//! Attempts are strictly sequential.

use crate::parser;
use crate::providers::local::AbortSignal;
use crate::providers::{
    AutofillRequest, FieldValues, ProgressCallback, ProviderKind, ProviderRegistry,
    SuggestionRequest,
};

pub struct CascadeExecutor {
    registry: ProviderRegistry,
}

impl CascadeExecutor {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run a suggestion through the cascade; returns the cleaned text and who produced it
    pub async fn suggest(
        &self,
        order: &[ProviderKind],
        request: &SuggestionRequest,
        prompt: &str,
    ) -> Option<(ProviderKind, String)> {
        for &kind in order {
            let Some(provider) = self.registry.get(kind) else {
                tracing::debug!(provider = %kind, "No client registered, skipping");
                continue;
            };

            tracing::debug!(provider = %kind, field = %request.field_name, "Trying provider for suggestion");
            let abort = AbortSignal::new();

            match provider.suggest(request, prompt, &abort).await {
                Ok(raw) => match parser::clean_suggestion(&raw) {
                    Some(text) => {
                        tracing::info!(provider = %kind, field = %request.field_name, "Suggestion resolved");
                        return Some((kind, text));
                    }
                    None => {
                        tracing::debug!(provider = %kind, "Provider returned an empty suggestion");
                    }
                },
                Err(e) if e.is_skip() => {
                    tracing::debug!(provider = %kind, reason = %e, "Provider skipped");
                }
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Provider failed, falling back");
                }
            }
        }

        tracing::debug!(field = %request.field_name, "No provider produced a suggestion");
        None
    }

    /// Run an autofill through the cascade; returns the raw values and who produced them
    pub async fn autofill(
        &self,
        order: &[ProviderKind],
        request: &AutofillRequest,
        prompt: &str,
        progress: Option<ProgressCallback>,
    ) -> Option<(ProviderKind, FieldValues)> {
        for &kind in order {
            let Some(provider) = self.registry.get(kind) else {
                tracing::debug!(provider = %kind, "No client registered, skipping");
                continue;
            };

            tracing::debug!(provider = %kind, fields = request.fields.len(), "Trying provider for autofill");
            let abort = AbortSignal::new();

            match provider.autofill(request, prompt, progress.clone(), &abort).await {
                Ok(values) if !values.is_empty() => {
                    tracing::info!(provider = %kind, keys = values.len(), "Autofill resolved");
                    return Some((kind, values));
                }
                Ok(_) => {
                    tracing::debug!(provider = %kind, "Provider returned an empty object");
                }
                Err(e) if e.is_skip() => {
                    tracing::debug!(provider = %kind, reason = %e, "Provider skipped");
                }
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Provider failed, falling back");
                }
            }
        }

        None
    }
}
