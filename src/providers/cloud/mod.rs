//! Cloud Provider Module
//!
//! Remote backends reached over HTTP:
//! - Custom suggestion server (`/api/suggest`, `/api/autofill`)
//! - OpenAI-compatible Chat Completions

mod client;
mod openai;

pub use client::{RemoteClient, AUTOFILL_PATH, SUGGEST_PATH};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL};
