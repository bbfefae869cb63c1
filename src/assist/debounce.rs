//! Per-Field Debounce Scheduler
//!
//! One cancellable delayed task per field name:
//! - scheduling a pending field aborts its timer and starts a new one
//! - on expiry the entry is removed and the task runs to completion
//! - `cancel_all` drops every pending timer without firing it

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{AssistError, AssistResult};

struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct DebounceScheduler {
    timers: Arc<DashMap<String, PendingTimer>>,
    next_id: Arc<AtomicU64>,
    quiet: Duration,
    runtime: Handle,
}

impl DebounceScheduler {
    pub fn new(quiet: Duration, runtime: Handle) -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            quiet,
            runtime,
        }
    }

    /// Scheduler on the runtime of the calling context
    pub fn current(quiet: Duration) -> AssistResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AssistError::Runtime(format!("Debounce timers need a tokio runtime: {}", e)))?;
        Ok(Self::new(quiet, runtime))
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Start (or restart) the timer for `field`; `task` runs once the quiet period elapses
    pub fn schedule<F, Fut>(&self, field: &str, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = field.to_string();
        let timers = self.timers.clone();
        let quiet = self.quiet;

        // Holding the entry keeps the shard locked until the new timer is stored,
        // so an expiring task can never observe a half-replaced slot.
        let entry = self.timers.entry(key.clone());

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(quiet).await;

            let still_ours = timers.remove_if(&key, |_, pending| pending.id == id).is_some();
            if still_ours {
                tracing::debug!(field = %key, "Debounce timer fired");
                task().await;
            }
        });

        match entry {
            Entry::Occupied(mut occupied) => {
                let stale = occupied.insert(PendingTimer { id, handle });
                stale.handle.abort();
                tracing::debug!(field = %field, "Debounce timer restarted");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PendingTimer { id, handle });
                tracing::debug!(field = %field, quiet_ms = quiet.as_millis(), "Debounce timer started");
            }
        }
    }

    /// Cancel the pending timer for `field`; a task already dispatched keeps running
    pub fn cancel(&self, field: &str) -> bool {
        match self.timers.remove(field) {
            Some((_, pending)) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer without firing
    pub fn cancel_all(&self) {
        let mut cancelled = 0usize;
        self.timers.retain(|_, pending| {
            pending.handle.abort();
            cancelled += 1;
            false
        });
        if cancelled > 0 {
            tracing::debug!(cancelled, "Pending debounce timers cancelled");
        }
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.timers.contains_key(field)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }
}
