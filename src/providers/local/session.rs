//! Abort and Download-Progress Plumbing
//!
//! Shared handles passed to the in-process model:
//! - a best-effort abort flag per attempt
//! - a download monitor that records the latest progress and resets when the
//!   attempt concludes

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::providers::ProgressCallback;

/// Best-effort cancellation flag for one provider attempt
///
/// Raised by the engine when an attempt times out. Implementations of the
/// local model may poll it; remote attempts are cancelled by dropping the
/// request future instead.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Caller-visible download progress of the local model
///
/// `None` means no download is active. Shared by every local attempt; the
/// progress is cleared only once the last tracked attempt concludes.
#[derive(Clone, Default)]
pub struct DownloadMonitor {
    state: Arc<RwLock<DownloadState>>,
}

#[derive(Default)]
struct DownloadState {
    progress: Option<f64>,
    active: usize,
}

impl DownloadMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<f64> {
        self.state.read().progress
    }

    pub fn reset(&self) {
        self.state.write().progress = None;
    }

    /// Attempts currently holding a guard
    pub fn active_attempts(&self) -> usize {
        self.state.read().active
    }

    /// Build an observer that records progress and forwards it to `forward`
    pub fn observer(&self, forward: Option<ProgressCallback>) -> ProgressCallback {
        let state = self.state.clone();
        Arc::new(move |percent: f64| {
            let percent = percent.clamp(0.0, 100.0);
            state.write().progress = Some(percent);
            if let Some(cb) = &forward {
                cb(percent);
            }
        })
    }

    /// Register an attempt; progress resets when the last guard drops
    pub fn track(&self) -> DownloadGuard {
        self.state.write().active += 1;
        DownloadGuard {
            monitor: self.clone(),
        }
    }
}

/// Releases one attempt on drop, whether it succeeded, failed, or was cancelled
pub struct DownloadGuard {
    monitor: DownloadMonitor,
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        let mut state = self.monitor.state.write();
        state.active = state.active.saturating_sub(1);
        if state.active == 0 {
            state.progress = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_abort_is_shared_between_clones() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_aborted());
        signal.abort();
        assert!(clone.is_aborted());
    }

    #[test]
    fn test_observer_records_and_forwards() {
        let monitor = DownloadMonitor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer = monitor.observer(Some(Arc::new(move |p: f64| sink.lock().push(p))));

        observer(12.5);
        assert_eq!(monitor.current(), Some(12.5));
        observer(140.0);
        assert_eq!(monitor.current(), Some(100.0));
        assert_eq!(*seen.lock(), vec![12.5, 100.0]);
    }

    #[test]
    fn test_guard_resets_on_drop() {
        let monitor = DownloadMonitor::new();
        {
            let _guard = monitor.track();
            monitor.observer(None)(40.0);
            assert_eq!(monitor.current(), Some(40.0));
        }
        assert_eq!(monitor.current(), None);
    }

    #[test]
    fn test_overlapping_attempts_keep_progress_until_last_finishes() {
        let monitor = DownloadMonitor::new();
        let downloading = monitor.track();
        monitor.observer(None)(30.0);

        let quick = monitor.track();
        assert_eq!(monitor.active_attempts(), 2);
        drop(quick);
        assert_eq!(monitor.current(), Some(30.0));

        drop(downloading);
        assert_eq!(monitor.current(), None);
        assert_eq!(monitor.active_attempts(), 0);
    }
}
