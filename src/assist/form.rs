//! Form Binding
//!
//! Connects a host form library to the engine. Field registrations get their
//! blur handler wrapped so that leaving a non-empty field schedules a
//! debounced suggestion; whole-form autofill writes results back through the
//! form's setter.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

use super::debounce::DebounceScheduler;
use super::engine::{placeholder_field, AssistEngine};
use crate::config::AssistConfig;
use crate::error::{AssistError, AssistResult};
use crate::providers::local::AvailabilityStatus;
use crate::providers::{FieldValues, FormContext, ProgressCallback};

/// The host form library, as seen by the assistant
pub trait FormState: Send + Sync + 'static {
    /// Snapshot of every field's current value
    fn values(&self) -> FormContext;

    fn value(&self, field: &str) -> Option<Value> {
        self.values().remove(field)
    }

    fn set_value(&self, field: &str, value: &Value) -> AssistResult<()>;
}

/// A field lost focus
#[derive(Debug, Clone)]
pub struct BlurEvent {
    pub field: String,
    pub value: Value,
}

pub type BlurHandler = Arc<dyn Fn(&BlurEvent) + Send + Sync>;

/// What the form library hands out when a field is registered
#[derive(Clone)]
pub struct FieldRegistration {
    pub name: String,
    pub on_blur: Option<BlurHandler>,
}

impl FieldRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_blur: None,
        }
    }

    pub fn with_on_blur(mut self, handler: BlurHandler) -> Self {
        self.on_blur = Some(handler);
        self
    }

    /// Fire the blur handler, if any
    pub fn blur(&self, value: impl Into<Value>) {
        if let Some(handler) = &self.on_blur {
            handler(&BlurEvent {
                field: self.name.clone(),
                value: value.into(),
            });
        }
    }
}

/// A resolved suggestion waiting for the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestion {
    pub value: String,
    pub request_id: u64,
    pub received_at: DateTime<Utc>,
}

/// Text form of a field value; null counts as empty
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    value.map(|v| value_text(v).trim().is_empty()).unwrap_or(true)
}

struct SessionState<F: FormState> {
    form: Arc<F>,
    engine: Arc<AssistEngine>,
    suggestions: DashMap<String, FieldSuggestion>,
    latest_request: DashMap<String, u64>,
    next_request: AtomicU64,
    availability: RwLock<Option<AvailabilityStatus>>,
    is_autofilling: AtomicBool,
}

impl<F: FormState> SessionState<F> {
    /// Read the live value and ask the engine; stores the answer unless a newer request exists
    async fn resolve_suggestion(&self, field: &str) -> Option<String> {
        let current = self.form.value(field);
        if is_blank(current.as_ref()) {
            tracing::debug!(field, "Field is empty at dispatch, no suggestion");
            return None;
        }
        let current = current.map(|v| value_text(&v)).unwrap_or_default();

        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_request.insert(field.to_string(), request_id);

        let suggestion = self
            .engine
            .suggest_value(field, &current, self.form.values())
            .await?;

        let latest = self.latest_request.get(field).map(|id| *id);
        if latest == Some(request_id) {
            self.suggestions.insert(
                field.to_string(),
                FieldSuggestion {
                    value: suggestion.clone(),
                    request_id,
                    received_at: Utc::now(),
                },
            );
        } else {
            tracing::debug!(field, request_id, "Stale suggestion discarded");
        }

        Some(suggestion)
    }

    async fn refresh_availability(&self) -> AvailabilityStatus {
        let status = self.engine.check_availability().await;
        *self.availability.write() = Some(status);
        status
    }
}

/// Resets the autofilling flag when autofill ends, including on error
struct AutofillFlag<'a>(&'a AtomicBool);

impl<'a> AutofillFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for AutofillFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One form session
///
/// Dropping it cancels every pending debounce timer.
pub struct FormAssistant<F: FormState> {
    state: Arc<SessionState<F>>,
    scheduler: DebounceScheduler,
    config: AssistConfig,
}

impl<F: FormState> FormAssistant<F> {
    /// Start a session; must be called from within a tokio runtime
    pub fn new(form: Arc<F>, engine: Arc<AssistEngine>, config: AssistConfig) -> AssistResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AssistError::Runtime(format!("Form sessions need a tokio runtime: {}", e)))?;

        let state = Arc::new(SessionState {
            form,
            engine,
            suggestions: DashMap::new(),
            latest_request: DashMap::new(),
            next_request: AtomicU64::new(0),
            availability: RwLock::new(None),
            is_autofilling: AtomicBool::new(false),
        });

        if config.auto_check_availability {
            let probe = state.clone();
            runtime.spawn(async move {
                let status = probe.refresh_availability().await;
                tracing::debug!(status = ?status.status, "Initial availability probe finished");
            });
        }

        let scheduler = DebounceScheduler::new(config.debounce(), runtime);
        tracing::debug!(debounce_ms = config.debounce_ms, excluded = config.excluded_fields.len(), "Form session started");

        Ok(Self {
            state,
            scheduler,
            config,
        })
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Wrap a field registration so leaving the field schedules a suggestion
    pub fn register(&self, registration: FieldRegistration) -> FieldRegistration {
        if self.config.is_excluded(&registration.name) {
            tracing::debug!(field = %registration.name, "Excluded field registered unchanged");
            return registration;
        }

        let field = registration.name.clone();
        let original = registration.on_blur.clone();
        let state: Weak<SessionState<F>> = Arc::downgrade(&self.state);
        let scheduler = self.scheduler.clone();

        let wrapped: BlurHandler = Arc::new(move |event: &BlurEvent| {
            if let Some(original) = &original {
                original(event);
            }

            let Some(state) = state.upgrade() else {
                return;
            };
            if !state.engine.is_enabled() || is_blank(Some(&event.value)) {
                return;
            }

            let task_field = field.clone();
            scheduler.schedule(&field, move || async move {
                state.resolve_suggestion(&task_field).await;
            });
        });

        FieldRegistration {
            name: registration.name,
            on_blur: Some(wrapped),
        }
    }

    pub fn suggestion(&self, field: &str) -> Option<FieldSuggestion> {
        self.state.suggestions.get(field).map(|s| s.clone())
    }

    pub fn suggestions(&self) -> Vec<(String, FieldSuggestion)> {
        self.state
            .suggestions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn clear_suggestion(&self, field: &str) {
        self.state.suggestions.remove(field);
    }

    /// Write the pending suggestion into the form; `false` when there is none
    pub fn accept_suggestion(&self, field: &str) -> AssistResult<bool> {
        let Some((_, suggestion)) = self.state.suggestions.remove(field) else {
            return Ok(false);
        };
        self.state.form.set_value(field, &Value::from(suggestion.value))?;
        Ok(true)
    }

    /// Request a suggestion immediately, skipping the quiet period
    pub async fn suggest_now(&self, field: &str) -> Option<String> {
        if self.config.is_excluded(field) {
            return None;
        }
        self.scheduler.cancel(field);
        self.state.resolve_suggestion(field).await
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.scheduler.is_pending(field)
    }

    pub fn is_autofilling(&self) -> bool {
        self.state.is_autofilling.load(Ordering::SeqCst)
    }

    /// Fill `fields` and write the values into the form
    ///
    /// Excluded fields are never sent. While the engine is disabled nothing is
    /// written and the returned mapping is empty. A failing form write is
    /// returned after the autofilling flag is cleared; provider failures never
    /// surface. The returned mapping holds exactly the values written.
    pub async fn autofill_form(
        &self,
        fields: &[String],
        on_progress: Option<ProgressCallback>,
    ) -> AssistResult<FieldValues> {
        if !self.state.engine.is_enabled() {
            tracing::debug!("Autofill skipped, assistance disabled");
            return Ok(FieldValues::new());
        }

        let context = self.state.form.values();

        let targets: Vec<String> = fields
            .iter()
            .filter(|f| !self.config.is_excluded(f))
            .filter(|f| !self.config.skip_non_empty || is_blank(context.get(f.as_str())))
            .cloned()
            .collect();

        if targets.is_empty() {
            return Ok(FieldValues::new());
        }

        let _flag = AutofillFlag::raise(&self.state.is_autofilling);
        let mut values = self.state.engine.autofill(&targets, context, on_progress).await;
        if !self.config.write_placeholders {
            values.retain(|field, value| {
                value.as_str().and_then(placeholder_field) != Some(field.as_str())
            });
        }

        for (field, value) in &values {
            self.state.form.set_value(field, value)?;
        }
        tracing::info!(fields = values.len(), "Form autofilled");

        Ok(values)
    }

    pub async fn refresh_availability(&self) -> AvailabilityStatus {
        self.state.refresh_availability().await
    }

    /// Last probed status; `None` until a probe completes
    pub fn availability(&self) -> Option<AvailabilityStatus> {
        *self.state.availability.read()
    }
}

impl<F: FormState> Drop for FormAssistant<F> {
    fn drop(&mut self) {
        self.scheduler.cancel_all();
    }
}
