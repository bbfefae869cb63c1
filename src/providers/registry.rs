//! Provider Registry
//!
//! Maps each provider kind to the client that serves it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::cloud::{OpenAiClient, RemoteClient};
use super::local::LocalModelClient;
use super::{AiProvider, ProviderDescriptor, ProviderKind};

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn AiProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build clients for every descriptor with a usable configuration
    ///
    /// Disabled descriptors are registered too: an explicit execution order may
    /// still name them. The first descriptor of each kind wins.
    pub fn from_descriptors(
        descriptors: &[ProviderDescriptor],
        api_url: &str,
        timeout: Duration,
        local: &LocalModelClient,
    ) -> Self {
        let mut registry = Self::new();

        for descriptor in descriptors {
            if registry.contains(descriptor.kind) {
                tracing::debug!(provider = %descriptor.kind, "Duplicate descriptor ignored");
                continue;
            }

            let provider: Arc<dyn AiProvider> = match descriptor.kind {
                ProviderKind::LocalModel => Arc::new(local.clone()),
                ProviderKind::CustomServer => {
                    Arc::new(RemoteClient::from_descriptor(descriptor, api_url, timeout))
                }
                ProviderKind::OpenAi => match OpenAiClient::from_descriptor(descriptor, timeout) {
                    Some(client) => Arc::new(client),
                    None => {
                        tracing::warn!("OpenAI provider configured without an API key, skipping");
                        continue;
                    }
                },
            };
            registry.register(provider);
        }

        registry
    }

    /// Register a provider, replacing any previous one of the same kind
    pub fn register(&mut self, provider: Arc<dyn AiProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn AiProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_clients_per_kind() {
        let descriptors = vec![
            ProviderDescriptor::new(ProviderKind::LocalModel, 10),
            ProviderDescriptor::new(ProviderKind::CustomServer, 5).disabled(),
            ProviderDescriptor::new(ProviderKind::OpenAi, 1).with_api_key("k"),
        ];
        let registry = ProviderRegistry::from_descriptors(
            &descriptors,
            "http://localhost:3001",
            Duration::from_secs(1),
            &LocalModelClient::absent(),
        );

        assert_eq!(registry.len(), 3);
        assert!(registry.contains(ProviderKind::CustomServer));
    }

    #[test]
    fn test_openai_without_key_is_not_registered() {
        let descriptors = vec![ProviderDescriptor::new(ProviderKind::OpenAi, 1)];
        let registry = ProviderRegistry::from_descriptors(
            &descriptors,
            "http://localhost:3001",
            Duration::from_secs(1),
            &LocalModelClient::absent(),
        );
        assert!(registry.is_empty());
        assert!(registry.get(ProviderKind::OpenAi).is_none());
    }
}
