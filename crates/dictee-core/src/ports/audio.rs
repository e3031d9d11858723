//! Audio output port used by the playback controller.
//!
//! | Implementor | Where used |
//! |---|---|
//! | `TimedOutput` | Headless runs and tests, simulated playback clock |
//! | `RodioOutput` | Desktop / CLI, rodio playback on the default device |
//!
//! Both traits are object-safe and every method takes `&self`; interior
//! mutability (channels, atomics) handles state changes inside each
//! implementation.

use crate::error::PlaybackError;
use crate::ports::NarrationAudio;

/// One-shot callback fired when a voice ends on its own.
///
/// `Ok(())` means natural end of stream; `Err` carries a description of the
/// underlying resource error. It is **not** fired after [`ActiveVoice::stop`].
pub type PlaybackEnd = Box<dyn FnOnce(Result<(), String>) + Send + 'static>;

/// A sink that can start playing one narration at a time.
pub trait AudioOutput: Send + Sync {
    /// Start playing `audio` at `rate` (already clamped by the caller).
    ///
    /// Errors that can be detected up front (undecodable container, missing
    /// device) are returned directly; later ones go through `on_end`.
    fn start(
        &self,
        audio: &NarrationAudio,
        rate: f32,
        on_end: PlaybackEnd,
    ) -> Result<Box<dyn ActiveVoice>, PlaybackError>;
}

/// Control surface of a voice started by an [`AudioOutput`].
pub trait ActiveVoice: Send + Sync {
    /// Suspend playback, keeping the position.
    fn pause(&self);

    /// Continue from the suspended position.
    fn resume(&self);

    /// Halt playback and release the resource. Idempotent.
    fn stop(&self);
}
