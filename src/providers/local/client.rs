//! In-Process Model Provider
//!
//! Wraps a capability-gated language model that may be absent entirely.
//! The model itself is an external collaborator: callers plug in their runtime
//! through the `LocalModel` and `LocalSession` traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::session::{AbortSignal, DownloadMonitor};
use crate::error::{LocalModelError, ProviderError};
use crate::parser;
use crate::providers::{
    AiProvider, AutofillRequest, FieldValues, ProgressCallback, ProviderKind, SuggestionRequest,
};

/// Raw readiness reported by the model's availability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAvailability {
    /// Ready to use now
    Available,
    /// Usable after a one-time download, which session creation triggers
    Downloadable,
    /// A download is already running
    Downloading,
    Unavailable,
}

/// Caller-facing availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    Ready,
    Downloadable,
    Downloading,
    Unavailable,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatus {
    pub available: bool,
    pub status: AvailabilityState,
    pub needs_download: bool,
}

impl AvailabilityStatus {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            status: AvailabilityState::Unavailable,
            needs_download: false,
        }
    }

    pub fn error() -> Self {
        Self {
            available: false,
            status: AvailabilityState::Error,
            needs_download: false,
        }
    }
}

impl From<ModelAvailability> for AvailabilityStatus {
    fn from(raw: ModelAvailability) -> Self {
        match raw {
            ModelAvailability::Available => Self {
                available: true,
                status: AvailabilityState::Ready,
                needs_download: false,
            },
            ModelAvailability::Downloadable => Self {
                available: true,
                status: AvailabilityState::Downloadable,
                needs_download: true,
            },
            ModelAvailability::Downloading => Self {
                available: true,
                status: AvailabilityState::Downloading,
                needs_download: true,
            },
            ModelAvailability::Unavailable => Self::unavailable(),
        }
    }
}

/// The in-process model capability
#[async_trait]
pub trait LocalModel: Send + Sync {
    async fn availability(&self) -> Result<ModelAvailability, LocalModelError>;

    /// Create a prompt session; may start a model download reported through `on_progress`
    async fn create_session(
        &self,
        on_progress: ProgressCallback,
        abort: AbortSignal,
    ) -> Result<Box<dyn LocalSession>, LocalModelError>;
}

/// One prompt session; `destroy` must be called after use
#[async_trait]
pub trait LocalSession: Send {
    async fn prompt(&mut self, text: &str, abort: &AbortSignal) -> Result<String, LocalModelError>;

    async fn destroy(&mut self);
}

/// Provider over an optional in-process model
#[derive(Clone)]
pub struct LocalModelClient {
    model: Option<Arc<dyn LocalModel>>,
    downloads: DownloadMonitor,
    timeout: Duration,
}

impl LocalModelClient {
    pub fn new(model: Option<Arc<dyn LocalModel>>, downloads: DownloadMonitor, timeout: Duration) -> Self {
        tracing::debug!(present = model.is_some(), "Local model client created");
        Self {
            model,
            downloads,
            timeout,
        }
    }

    /// Client for a host with no local model capability
    pub fn absent() -> Self {
        Self::new(None, DownloadMonitor::new(), Duration::from_secs(30))
    }

    pub fn is_present(&self) -> bool {
        self.model.is_some()
    }

    /// Probe availability; never fails
    pub async fn check_availability(&self) -> AvailabilityStatus {
        let Some(model) = &self.model else {
            return AvailabilityStatus::unavailable();
        };

        match tokio::time::timeout(self.timeout, model.availability()).await {
            Ok(Ok(raw)) => {
                tracing::debug!(availability = ?raw, "Local model probed");
                raw.into()
            }
            Ok(Err(e)) => {
                tracing::warn!("Local model availability probe failed: {}", e);
                AvailabilityStatus::error()
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis(), "Local model availability check timed out");
                AvailabilityStatus::error()
            }
        }
    }

    /// One independent attempt: probe, create, prompt, destroy
    async fn generate(
        &self,
        prompt: &str,
        progress: Option<ProgressCallback>,
        abort: &AbortSignal,
    ) -> Result<String, ProviderError> {
        let model = self.model.as_ref().ok_or_else(LocalModelError::not_available)?;

        let availability = match tokio::time::timeout(self.timeout, model.availability()).await {
            Ok(result) => result?,
            Err(_) => {
                abort.abort();
                return Err(ProviderError::timeout("Local availability check timed out"));
            }
        };

        match availability {
            ModelAvailability::Unavailable => {
                return Err(ProviderError::unavailable("Local model reports unavailable"));
            }
            ModelAvailability::Downloadable => {
                tracing::info!("Local model needs a download, creating session anyway");
            }
            ModelAvailability::Downloading | ModelAvailability::Available => {}
        }

        let _download = self.downloads.track();
        let observer = self.downloads.observer(progress);

        let mut session = match tokio::time::timeout(
            self.timeout,
            model.create_session(observer, abort.clone()),
        )
        .await
        {
            Ok(session) => session?,
            Err(_) => {
                abort.abort();
                return Err(ProviderError::timeout("Local session creation timed out"));
            }
        };

        let result = match tokio::time::timeout(self.timeout, session.prompt(prompt, abort)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                abort.abort();
                Err(ProviderError::timeout(format!(
                    "Local prompt timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        session.destroy().await;

        let text = result?;
        if text.trim().is_empty() {
            return Err(ProviderError::empty("Local model returned no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiProvider for LocalModelClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalModel
    }

    fn name(&self) -> &str {
        "Local Model"
    }

    async fn suggest(
        &self,
        _request: &SuggestionRequest,
        prompt: &str,
        abort: &AbortSignal,
    ) -> Result<String, ProviderError> {
        self.generate(prompt, None, abort).await
    }

    async fn autofill(
        &self,
        _request: &AutofillRequest,
        prompt: &str,
        progress: Option<ProgressCallback>,
        abort: &AbortSignal,
    ) -> Result<FieldValues, ProviderError> {
        let text = self.generate(prompt, progress, abort).await?;
        parser::parse_object_from_text(&text)
    }
}
