//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the exam engine expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` or `rodio` types in any signature
//! - Completion of asynchronous work is reported through return values or a
//!   single one-shot callback, never through shared mutable flags

pub mod audio;
pub mod narration;

pub use audio::{ActiveVoice, AudioOutput, PlaybackEnd};
pub use narration::{BackendHealth, NarrationAudio, NarrationBackend};
