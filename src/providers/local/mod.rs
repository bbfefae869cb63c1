//! Local Provider Module
//!
//! In-process model inference through a pluggable capability.
//! Each attempt is independent: probe, create a session, prompt, destroy.

mod client;
mod session;

pub use client::{
    AvailabilityState, AvailabilityStatus, LocalModel, LocalModelClient, LocalSession,
    ModelAvailability,
};
pub use session::{AbortSignal, DownloadGuard, DownloadMonitor};
