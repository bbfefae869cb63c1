//! Test Doubles
//!
//! Scripted stand-ins for the external collaborators: the in-process model,
//! a provider backend, and the host form library.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::assist::FormState;
use crate::error::{AssistError, AssistResult, LocalModelError, ProviderError};
use crate::parser;
use crate::providers::local::{AbortSignal, LocalModel, LocalSession, ModelAvailability};
use crate::providers::{
    AiProvider, AutofillRequest, FieldValues, FormContext, ProgressCallback, ProviderKind,
    SuggestionRequest,
};

// ---------------------------------------------------------------------------
// Local model
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum FakeLocalReply {
    Text(String),
    Fail,
    /// The prompt never resolves
    Hang,
}

pub struct FakeLocalModel {
    /// `None` makes the probe itself fail
    availability: Option<ModelAvailability>,
    reply: FakeLocalReply,
    progress: Vec<f64>,
    hang_availability: bool,
    hang_session: bool,
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    last_abort: Mutex<Option<AbortSignal>>,
}

impl FakeLocalModel {
    pub fn new(availability: ModelAvailability, reply: FakeLocalReply) -> Self {
        Self {
            availability: Some(availability),
            reply,
            progress: Vec::new(),
            hang_availability: false,
            hang_session: false,
            created: AtomicUsize::new(0),
            destroyed: Arc::new(AtomicUsize::new(0)),
            last_abort: Mutex::new(None),
        }
    }

    /// The availability check never resolves
    pub fn hanging_availability() -> Self {
        Self {
            hang_availability: true,
            ..Self::new(ModelAvailability::Available, FakeLocalReply::Fail)
        }
    }

    /// Session creation never resolves
    pub fn with_hanging_session(mut self) -> Self {
        self.hang_session = true;
        self
    }

    pub fn failing_probe() -> Self {
        Self {
            availability: None,
            ..Self::new(ModelAvailability::Available, FakeLocalReply::Fail)
        }
    }

    /// Progress values emitted while the session is being created
    pub fn with_progress(mut self, progress: Vec<f64>) -> Self {
        self.progress = progress;
        self
    }

    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn sessions_destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Abort signal handed to the most recent session creation
    pub fn last_abort(&self) -> Option<AbortSignal> {
        self.last_abort.lock().clone()
    }
}

#[async_trait]
impl LocalModel for FakeLocalModel {
    async fn availability(&self) -> Result<ModelAvailability, LocalModelError> {
        if self.hang_availability {
            std::future::pending::<()>().await;
        }
        self.availability
            .ok_or_else(|| LocalModelError::session_failed("probe exploded"))
    }

    async fn create_session(
        &self,
        on_progress: ProgressCallback,
        abort: AbortSignal,
    ) -> Result<Box<dyn LocalSession>, LocalModelError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_abort.lock() = Some(abort);
        if self.hang_session {
            std::future::pending::<()>().await;
        }
        for percent in &self.progress {
            on_progress(*percent);
        }
        Ok(Box::new(FakeSession {
            reply: self.reply.clone(),
            destroyed: self.destroyed.clone(),
        }))
    }
}

struct FakeSession {
    reply: FakeLocalReply,
    destroyed: Arc<AtomicUsize>,
}

#[async_trait]
impl LocalSession for FakeSession {
    async fn prompt(&mut self, _text: &str, _abort: &AbortSignal) -> Result<String, LocalModelError> {
        match &self.reply {
            FakeLocalReply::Text(text) => Ok(text.clone()),
            FakeLocalReply::Fail => Err(LocalModelError::prompt_failed("scripted failure")),
            FakeLocalReply::Hang => {
                std::future::pending::<()>().await;
                Err(LocalModelError::aborted())
            }
        }
    }

    async fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum FakeAnswer {
    /// Raw text; autofill parses a JSON object out of it
    Text(String),
    Values(FieldValues),
    Unavailable,
    Fail,
}

pub struct FakeProvider {
    kind: ProviderKind,
    answer: FakeAnswer,
    delay: Option<Duration>,
    suggest_calls: AtomicUsize,
    autofill_calls: AtomicUsize,
    seen_values: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind, answer: FakeAnswer) -> Self {
        Self {
            kind,
            answer,
            delay: None,
            suggest_calls: AtomicUsize::new(0),
            autofill_calls: AtomicUsize::new(0),
            seen_values: Mutex::new(Vec::new()),
        }
    }

    pub fn text(kind: ProviderKind, text: &str) -> Arc<Self> {
        Arc::new(Self::new(kind, FakeAnswer::Text(text.to_string())))
    }

    pub fn failing(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self::new(kind, FakeAnswer::Fail))
    }

    pub fn unavailable(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self::new(kind, FakeAnswer::Unavailable))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }

    pub fn autofill_calls(&self) -> usize {
        self.autofill_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.suggest_calls() + self.autofill_calls()
    }

    /// Current values seen by `suggest`, in call order
    pub fn seen_values(&self) -> Vec<String> {
        self.seen_values.lock().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn name(&self) -> &str {
        "Fake"
    }

    async fn suggest(
        &self,
        request: &SuggestionRequest,
        _prompt: &str,
        _abort: &AbortSignal,
    ) -> Result<String, ProviderError> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_values.lock().push(request.current_value.clone());
        self.pause().await;

        match &self.answer {
            FakeAnswer::Text(text) => Ok(text.clone()),
            FakeAnswer::Values(_) => Err(ProviderError::empty("no suggestion scripted")),
            FakeAnswer::Unavailable => Err(ProviderError::unavailable("scripted unavailable")),
            FakeAnswer::Fail => Err(ProviderError::network("scripted failure")),
        }
    }

    async fn autofill(
        &self,
        _request: &AutofillRequest,
        _prompt: &str,
        progress: Option<ProgressCallback>,
        _abort: &AbortSignal,
    ) -> Result<FieldValues, ProviderError> {
        self.autofill_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if let Some(cb) = progress {
            cb(100.0);
        }

        match &self.answer {
            FakeAnswer::Text(text) => parser::parse_object_from_text(text),
            FakeAnswer::Values(values) => Ok(values.clone()),
            FakeAnswer::Unavailable => Err(ProviderError::unavailable("scripted unavailable")),
            FakeAnswer::Fail => Err(ProviderError::network("scripted failure")),
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeForm {
    values: RwLock<FormContext>,
    writes: Mutex<Vec<(String, Value)>>,
    failing_field: Option<String>,
}

impl FakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(pairs: &[(&str, &str)]) -> Self {
        let form = Self::new();
        for (field, value) in pairs {
            form.put(field, value);
        }
        form
    }

    /// `set_value` on this field returns an error
    pub fn failing_on(mut self, field: &str) -> Self {
        self.failing_field = Some(field.to_string());
        self
    }

    /// Simulate the user typing, without going through `set_value`
    pub fn put(&self, field: &str, value: &str) {
        self.values.write().insert(field.to_string(), Value::from(value));
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().clone()
    }
}

impl FormState for FakeForm {
    fn values(&self) -> FormContext {
        self.values.read().clone()
    }

    fn set_value(&self, field: &str, value: &Value) -> AssistResult<()> {
        if self.failing_field.as_deref() == Some(field) {
            return Err(AssistError::Form(format!("field '{}' rejected the value", field)));
        }
        self.values.write().insert(field.to_string(), value.clone());
        self.writes.lock().push((field.to_string(), value.clone()));
        Ok(())
    }
}
