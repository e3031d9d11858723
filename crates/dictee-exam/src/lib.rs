//! Dictation exam engine.
//!
//! Orchestrates a three-phase French dictation read aloud by a narration
//! backend:
//!
//! - [`orchestrator`]: phase state machine, pause, skip and reset
//! - [`playback`]: single active voice with awaitable completion
//! - [`pregen`]: warms the narration cache before a run
//! - [`output`]: audio outputs (timed clock, and the default device behind
//!   the `local-audio` feature)

pub mod orchestrator;
pub mod output;
pub mod playback;
pub mod pregen;

pub use orchestrator::{ExamOrchestrator, ExamSnapshot, RunHandle, RunOutcome};
#[cfg(feature = "local-audio")]
pub use output::RodioOutput;
pub use output::{OutputError, TimedOutput, wav_duration};
pub use playback::{PendingPlayback, PlaybackController, PlaybackState, StopMode};
pub use pregen::{PregenerationProgress, PregenerationState, PregenerationStatus, Pregenerator};
