//! AI-assisted form suggestions and autofill
//!
//! Field suggestions and whole-form autofill over a cascade of providers: an
//! optional in-process model first, remote HTTP endpoints as fallback.

pub mod assist;
pub mod config;
pub mod error;
pub mod parser;
pub mod providers;

#[cfg(test)]
mod test_support;

pub use assist::{
    fallback_placeholder, placeholder_field, AssistEngine, AssistEngineBuilder, BlurEvent,
    BlurHandler, DebounceScheduler, FieldRegistration, FieldSuggestion, FormAssistant, FormState,
    AI_DISABLED_MARKER, PLACEHOLDER_PREFIX,
};
pub use config::AssistConfig;
pub use error::{AssistError, AssistResult, LocalModelError, ProviderError};
pub use providers::local::{AbortSignal, AvailabilityState, AvailabilityStatus, LocalModel, LocalSession, ModelAvailability};
pub use providers::{
    resolve_execution_order, AiProvider, AutofillRequest, FieldValues, FormContext,
    ProgressCallback, ProviderDescriptor, ProviderKind, SuggestionRequest,
};
