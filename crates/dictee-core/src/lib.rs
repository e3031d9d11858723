//! Core domain types and port definitions for the dictation exam engine.
//!
//! This crate is the dependency root of the workspace. It holds:
//!
//! - [`domain`]: dictation texts, exam phases, announcements, scoring
//! - [`text`]: sentence segmentation and spoken-punctuation forms
//! - [`ports`]: traits the engine expects from infrastructure
//!   (narration backend, audio output)
//! - [`events`]: observable outputs for the UI layer
//! - [`settings`]: exam pacing configuration
//! - [`error`]: the error taxonomy shared by every adapter
//!
//! Nothing here performs I/O or owns a runtime.

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;
pub mod text;

pub use domain::{
    ContentBank, Dictation, ExamPhase, GrammarRule, PhaseAnnouncements, ReadingPass,
    RuleCategory, ScoreReport, WordMismatch, pregeneration_segments, score_transcript,
};
pub use error::{ContentError, ExamError, NarrationError, PlaybackError};
pub use events::ExamEvent;
pub use ports::{
    ActiveVoice, AudioOutput, BackendHealth, NarrationAudio, NarrationBackend, PlaybackEnd,
};
pub use settings::{ExamSettings, PhaseTimings, clamp_playback_rate};
pub use text::{PunctuationMark, SpokenSegment, build_spoken_form, split_into_sentences};
