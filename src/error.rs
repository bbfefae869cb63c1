//! formassist Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.
//! Provider-level errors never reach the caller of the engine: they are logged
//! and the cascade moves on. Only form writes surface as `AssistError`.

use thiserror::Error;

/// Main error type for formassist operations
#[derive(Debug, Error)]
pub enum AssistError {
    /// A provider attempt failed
    #[error("Provider Error: {0}")]
    Provider(#[from] ProviderError),
    /// The in-process model failed
    #[error("Local Model Error: {0}")]
    LocalModel(#[from] LocalModelError),
    /// The form-state library rejected a write
    #[error("Form Error: {0}")]
    Form(String),
    /// Configuration errors
    #[error("Config Error: {0}")]
    Config(String),
    /// No async runtime available for timers
    #[error("Runtime Error: {0}")]
    Runtime(String),
}

/// Provider-related errors
#[derive(Debug, Clone, Error)]
#[error("[{kind:?}] {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Capability absent or reporting unavailable; skipped, not a failure
    Unavailable,
    /// Execution order names a provider nothing is registered for
    Unresolved,
    Network,
    Timeout,
    /// Non-2xx HTTP status
    Status,
    InvalidResponse,
    /// Provider answered with nothing usable
    Empty,
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unresolved,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn status(code: u16, body: impl AsRef<str>) -> Self {
        Self {
            kind: ProviderErrorKind::Status,
            message: format!("HTTP {}: {}", code, body.as_ref()),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidResponse,
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Empty,
            message: message.into(),
        }
    }

    /// Whether the cascade should treat this as a skip rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::Unavailable | ProviderErrorKind::Unresolved
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::invalid_response(err.to_string())
        } else {
            ProviderError::network(err.to_string())
        }
    }
}

/// In-process model errors
#[derive(Debug, Clone, Error)]
#[error("[{kind:?}] {message}")]
pub struct LocalModelError {
    pub kind: LocalModelErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalModelErrorKind {
    NotAvailable,
    SessionFailed,
    PromptFailed,
    Aborted,
}

impl LocalModelError {
    pub fn not_available() -> Self {
        Self {
            kind: LocalModelErrorKind::NotAvailable,
            message: "Local model capability is not present".into(),
        }
    }

    pub fn session_failed(message: impl Into<String>) -> Self {
        Self {
            kind: LocalModelErrorKind::SessionFailed,
            message: message.into(),
        }
    }

    pub fn prompt_failed(message: impl Into<String>) -> Self {
        Self {
            kind: LocalModelErrorKind::PromptFailed,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self {
            kind: LocalModelErrorKind::Aborted,
            message: "Request aborted".into(),
        }
    }
}

impl From<LocalModelError> for ProviderError {
    fn from(err: LocalModelError) -> Self {
        match err.kind {
            LocalModelErrorKind::NotAvailable => ProviderError::unavailable(err.message),
            LocalModelErrorKind::Aborted => ProviderError::timeout(err.message),
            _ => ProviderError::invalid_response(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AssistError {
    fn from(err: std::io::Error) -> Self {
        AssistError::Config(err.to_string())
    }
}

/// Result type alias for formassist operations
pub type AssistResult<T> = Result<T, AssistError>;
