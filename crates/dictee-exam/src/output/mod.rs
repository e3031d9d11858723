//! [`AudioOutput`](dictee_core::AudioOutput) implementations.
//!
//! - [`TimedOutput`] reads the WAV header and runs a pausable clock for the
//!   scaled duration. No sound, no device; used headless and in tests.
//! - `RodioOutput` (feature `local-audio`) plays on the default device.

#[cfg(feature = "local-audio")]
mod local;
mod timed;

#[cfg(feature = "local-audio")]
pub use local::RodioOutput;
pub use timed::{TimedOutput, wav_duration};

use dictee_core::PlaybackError;
use thiserror::Error;

/// Errors raised while starting a voice. Mapped to
/// [`PlaybackError::Failed`] at the port boundary.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot decode narration audio: {0}")]
    Decode(String),

    #[error("audio output unavailable: {0}")]
    Device(String),

    #[error("no tokio runtime to drive the playback clock")]
    NoRuntime,
}

impl From<OutputError> for PlaybackError {
    fn from(err: OutputError) -> Self {
        Self::Failed(err.to_string())
    }
}
