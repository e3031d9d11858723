//! Error taxonomy for the exam engine.
//!
//! `Aborted` appears in each layer and is expected control flow: a suspended
//! step observed that its run was superseded (skip, reset, new text). It is
//! never presented to the user as a failure.

use std::time::Duration;

use thiserror::Error;

/// Errors from the narration backend or the narration cache in front of it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NarrationError {
    /// Backend unreachable or the request returned an error status.
    #[error("Narration unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer within the configured interval.
    #[error("Narration timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation signal fired while the request was in flight.
    #[error("Narration request aborted")]
    Aborted,
}

/// Errors from the playback controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The audio resource could not be decoded or played.
    #[error("Audio playback failed: {0}")]
    Failed(String),

    /// Playback was interrupted by cancellation or an explicit rejecting stop.
    #[error("Audio playback aborted")]
    Aborted,
}

/// Errors surfaced by the exam orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExamError {
    /// The run this step belongs to has been superseded.
    #[error("Exam run aborted")]
    Aborted,

    /// Narration for a live phase step could not be obtained.
    #[error(transparent)]
    Narration(NarrationError),

    /// Playback of a live phase step failed.
    #[error(transparent)]
    Playback(PlaybackError),

    /// The health check reported the narration backend as unreachable.
    #[error("Narration backend is unreachable, start the TTS server and retry")]
    NarrationOffline,

    /// An operation needs a selected dictation text.
    #[error("No dictation text selected")]
    NoDictationSelected,

    /// Pre-generation is still running and has not been skipped.
    #[error("Audio pre-generation still in progress")]
    PregenerationInProgress,

    /// The operation is not allowed while an exam run is live.
    #[error("An exam is already in progress")]
    ExamInProgress,

    /// A spawned phase task panicked or was cancelled by the runtime.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExamError {
    /// Whether this error is the silent "superseded run" condition.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl From<NarrationError> for ExamError {
    fn from(err: NarrationError) -> Self {
        match err {
            NarrationError::Aborted => Self::Aborted,
            other => Self::Narration(other),
        }
    }
}

impl From<PlaybackError> for ExamError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Aborted => Self::Aborted,
            other => Self::Playback(other),
        }
    }
}

/// Errors raised while loading the content bank.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid content bank JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Dictation {id} is invalid: {reason}")]
    InvalidDictation { id: u32, reason: String },

    #[error("Duplicate dictation id {0}")]
    DuplicateId(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_variants_collapse_into_exam_aborted() {
        assert_eq!(ExamError::from(NarrationError::Aborted), ExamError::Aborted);
        assert_eq!(ExamError::from(PlaybackError::Aborted), ExamError::Aborted);
        assert!(ExamError::from(PlaybackError::Aborted).is_aborted());
    }

    #[test]
    fn failures_stay_typed() {
        let err = ExamError::from(NarrationError::Timeout(Duration::from_secs(60)));
        assert!(matches!(err, ExamError::Narration(NarrationError::Timeout(_))));
        assert!(!err.is_aborted());

        let err = ExamError::from(PlaybackError::Failed("corrupt stream".into()));
        assert_eq!(err.to_string(), "Audio playback failed: corrupt stream");
    }
}
