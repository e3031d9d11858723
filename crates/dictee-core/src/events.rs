//! Events emitted by the exam orchestrator to the UI / application layer.

use std::time::Duration;

use serde::Serialize;

use crate::domain::{ExamPhase, ReadingPass};

/// Observable outputs of an exam run.
///
/// Sent on the unbounded channel returned by the orchestrator constructor.
/// Ordering within one run follows the order the steps happen in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExamEvent {
    /// A dictation text was selected; previous run state is gone.
    DictationSelected { id: u32, title: String, sentences: usize },

    /// Result of the narration backend health check.
    NarrationStatus { available: bool },

    /// One more pre-generation segment was attempted.
    PregenerationProgress { completed: usize, total: usize },

    /// Pre-generation ended, either after the last segment or on skip.
    PregenerationFinished {
        completed: usize,
        failed: usize,
        total: usize,
        skipped: bool,
    },

    /// The orchestrator entered a new phase.
    PhaseChanged { phase: ExamPhase },

    /// A sentence pass is about to be read (dictée only).
    ReadingStarted {
        /// Zero-based sentence index.
        index: usize,
        total: usize,
        pass: ReadingPass,
        sentence: String,
    },

    /// Every sentence of the dictée phase has been read twice.
    ReadingsFinished,

    /// The phase-1 announcement was cut short by the user.
    IntroSkipped,

    Paused,
    Resumed,

    /// Elapsed time since the exam started, once per second while running.
    Tick { elapsed: Duration },

    /// Terminal signal; unlocks scoring.
    Finished { elapsed: Duration },

    /// The live run stopped on a narration or playback failure.
    RunFailed { message: String },
}
