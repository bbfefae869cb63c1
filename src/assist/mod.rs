pub mod cascade;
pub mod debounce;
pub mod engine;
pub mod form;
pub mod prompts;


pub use cascade::CascadeExecutor;
pub use debounce::DebounceScheduler;
pub use engine::{
    fallback_placeholder, placeholder_field, AssistEngine, AssistEngineBuilder, AI_DISABLED_MARKER,
    PLACEHOLDER_PREFIX,
};
pub use form::{BlurEvent, BlurHandler, FieldRegistration, FieldSuggestion, FormAssistant, FormState};
