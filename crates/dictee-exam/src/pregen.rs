//! Pre-generation pipeline: warms the narration cache before a run.
//!
//! Walks the ordered segment list sequentially. The skip flag is checked
//! between segments, so a segment already in flight still completes. Segment
//! failures are logged and counted; the live run fetches on demand anyway.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dictee_core::NarrationError;
use dictee_narration::NarrationService;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one pre-generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PregenerationStatus {
    Pending,
    Running,
    /// Every segment was attempted.
    Completed,
    /// Stopped early on user request. Not an error.
    Skipped,
    /// Discarded because the text changed or the engine was reset.
    Cancelled,
}

impl PregenerationStatus {
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Cancelled)
    }
}

/// Snapshot of a [`PregenerationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PregenerationProgress {
    pub total: usize,
    /// Attempted segments, successes and failures alike.
    pub completed: usize,
    pub failed: usize,
    pub skip_requested: bool,
    pub status: PregenerationStatus,
}

/// Shared progress of one pre-generation pass.
///
/// Lives only as long as the pass (and whoever observes it). Cancelling it
/// aborts the in-flight request; skipping only stops before the next one.
#[derive(Debug)]
pub struct PregenerationState {
    total: usize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    skip_requested: AtomicBool,
    status: Mutex<PregenerationStatus>,
    cancel: CancellationToken,
}

impl PregenerationState {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skip_requested: AtomicBool::new(false),
            status: Mutex::new(PregenerationStatus::Pending),
            cancel: CancellationToken::new(),
        }
    }

    /// Ask the pipeline to stop before its next segment.
    ///
    /// Returns `false` when the pass already finished or a skip was already
    /// requested.
    pub fn request_skip(&self) -> bool {
        if self.status().is_finished() {
            return false;
        }
        !self.skip_requested.swap(true, Ordering::SeqCst)
    }

    pub fn skip_requested(&self) -> bool {
        self.skip_requested.load(Ordering::SeqCst)
    }

    /// Abort the pass, including the request in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn status(&self) -> PregenerationStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the pass still blocks the start of an exam.
    pub fn blocks_start(&self) -> bool {
        matches!(
            self.status(),
            PregenerationStatus::Pending | PregenerationStatus::Running
        ) && !self.skip_requested()
    }

    pub fn progress(&self) -> PregenerationProgress {
        PregenerationProgress {
            total: self.total,
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            skip_requested: self.skip_requested(),
            status: self.status(),
        }
    }

    fn set_status(&self, status: PregenerationStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// Runs pre-generation passes against a [`NarrationService`].
pub struct Pregenerator {
    narration: Arc<NarrationService>,
    speed: f32,
}

impl Pregenerator {
    /// `speed` must be the one the live run requests narration at, or the
    /// warmed entries will never be hit.
    pub fn new(narration: Arc<NarrationService>, speed: f32) -> Self {
        Self { narration, speed }
    }

    /// Narrate every segment in order, calling `on_progress` after each
    /// attempt. Returns the final progress.
    pub async fn run<F>(
        &self,
        segments: &[String],
        state: &PregenerationState,
        mut on_progress: F,
    ) -> PregenerationProgress
    where
        F: FnMut(PregenerationProgress) + Send,
    {
        state.set_status(PregenerationStatus::Running);
        info!(total = state.total, "Pre-generating narration");

        for (index, segment) in segments.iter().enumerate() {
            if state.skip_requested() {
                info!(completed = index, total = state.total, "Pre-generation skipped");
                state.set_status(PregenerationStatus::Skipped);
                return state.progress();
            }

            match self.narration.fetch(segment, self.speed, &state.cancel).await {
                Ok(audio) => debug!(index, bytes = audio.len(), "Segment ready"),
                Err(NarrationError::Aborted) => {
                    debug!(index, "Pre-generation cancelled");
                    state.set_status(PregenerationStatus::Cancelled);
                    return state.progress();
                }
                Err(err) => {
                    warn!(index, error = %err, "Segment pre-generation failed, continuing");
                    state.failed.fetch_add(1, Ordering::SeqCst);
                }
            }

            state.completed.fetch_add(1, Ordering::SeqCst);
            on_progress(state.progress());
        }

        state.set_status(PregenerationStatus::Completed);
        let progress = state.progress();
        info!(
            completed = progress.completed,
            failed = progress.failed,
            "Pre-generation complete"
        );
        progress
    }
}
