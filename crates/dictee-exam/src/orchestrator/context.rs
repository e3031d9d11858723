//! Mutable state of one orchestrator instance.

use std::sync::Arc;
use std::time::Duration;

use dictee_core::{
    Dictation, ExamError, ExamPhase, PhaseAnnouncements, ReadingPass, split_into_sentences,
    text::spoken_form_or_raw,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::pregen::PregenerationState;

/// Everything a run reads from the selected text, computed once at
/// selection.
#[derive(Debug)]
pub(crate) struct RunMaterial {
    pub(crate) dictation: Dictation,
    pub(crate) sentences: Vec<String>,
    /// Spoken-punctuation form of each sentence, same order.
    pub(crate) spoken: Vec<String>,
    pub(crate) announcements: PhaseAnnouncements,
}

impl RunMaterial {
    pub(crate) fn new(dictation: Dictation) -> Self {
        let sentences = split_into_sentences(&dictation.text);
        let spoken = sentences.iter().map(|s| spoken_form_or_raw(s)).collect();
        let announcements = PhaseAnnouncements::for_dictation(&dictation);
        Self {
            dictation,
            sentences,
            spoken,
            announcements,
        }
    }
}

/// The token/signal pair scoping one causal chain of phase steps.
#[derive(Debug, Clone)]
pub(crate) struct RunTicket {
    pub(crate) token: u64,
    pub(crate) cancel: CancellationToken,
}

/// Run state, guarded by the orchestrator's mutex.
///
/// Only the orchestrator writes `phase`, `sentence_index`, `reading_pass`,
/// `paused` and `run_token`. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub(crate) struct ExamRunContext {
    pub(crate) material: Option<Arc<RunMaterial>>,
    pub(crate) phase: ExamPhase,
    pub(crate) sentence_index: Option<usize>,
    pub(crate) reading_pass: Option<ReadingPass>,
    pub(crate) paused: bool,
    pub(crate) run_token: u64,
    pub(crate) cancel: CancellationToken,
    pub(crate) exam_in_progress: bool,
    /// A skip was requested and its chain has not reached its target yet.
    pub(crate) skip_in_progress: bool,
    /// The phase-1 announcement is being narrated.
    pub(crate) intro_active: bool,
    pub(crate) intro_skipped: bool,
    pub(crate) started_at: Option<Instant>,
    pub(crate) ticker: Option<JoinHandle<()>>,
    pub(crate) pregeneration: Option<Arc<PregenerationState>>,
    /// `None` until the first health check.
    pub(crate) narration_online: Option<bool>,
}

impl ExamRunContext {
    /// Supersede the current chain: fire its signal, bump the token and
    /// arm a fresh signal.
    pub(crate) fn advance_token(&mut self) -> RunTicket {
        self.cancel.cancel();
        self.run_token += 1;
        self.cancel = CancellationToken::new();
        RunTicket {
            token: self.run_token,
            cancel: self.cancel.clone(),
        }
    }

    pub(crate) fn is_current(&self, ticket: &RunTicket) -> bool {
        self.run_token == ticket.token && !ticket.cancel.is_cancelled()
    }

    pub(crate) fn clear_reading(&mut self) {
        self.sentence_index = None;
        self.reading_pass = None;
    }

    pub(crate) fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    pub(crate) fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|at| at.elapsed())
    }

    /// Drop every trace of the live run and return to `Idle`. The caller
    /// advances the token.
    pub(crate) fn abandon_run(&mut self) {
        self.phase = ExamPhase::Idle;
        self.exam_in_progress = false;
        self.skip_in_progress = false;
        self.paused = false;
        self.intro_active = false;
        self.intro_skipped = false;
        self.started_at = None;
        self.clear_reading();
        self.stop_ticker();
    }

    /// Why a start would be refused right now, if it would. A backend that
    /// was never health-checked counts as offline.
    pub(crate) fn start_blocker(&self) -> Option<ExamError> {
        if self.material.is_none() {
            Some(ExamError::NoDictationSelected)
        } else if self.narration_online != Some(true) {
            Some(ExamError::NarrationOffline)
        } else if self
            .pregeneration
            .as_ref()
            .is_some_and(|state| state.blocks_start())
        {
            Some(ExamError::PregenerationInProgress)
        } else {
            None
        }
    }

    pub(crate) fn can_start(&self) -> bool {
        !self.exam_in_progress && self.phase == ExamPhase::Idle && self.start_blocker().is_none()
    }
}
