//! Narration adapters for the dictation exam engine.
//!
//! - [`HttpNarrationBackend`] implements the core
//!   [`NarrationBackend`](dictee_core::NarrationBackend) port over HTTP.
//! - [`NarrationService`] puts a `(text, speed)` cache and cancellation in
//!   front of any backend; the exam crate only talks to this type.

mod config;
mod error;
mod http;
mod service;

pub use config::NarrationClientConfig;
pub use http::HttpNarrationBackend;
pub use service::{NarrationService, NarrationStats};
