//! Token-checked primitives for one causal chain of phase steps.
//!
//! Every suspension point re-checks the ticket when it wakes up. A stale
//! chain gets [`ExamError::Aborted`] and unwinds without touching shared
//! state.

use std::sync::Arc;
use std::time::Duration;

use dictee_core::{ExamError, ExamEvent, ExamPhase, ExamSettings, NarrationAudio, ReadingPass};
use tracing::trace;

use super::Shared;
use super::context::{ExamRunContext, RunMaterial, RunTicket};
use crate::playback::PendingPlayback;

pub(crate) struct RunScope {
    shared: Arc<Shared>,
    ticket: RunTicket,
}

impl RunScope {
    pub(crate) const fn new(shared: Arc<Shared>, ticket: RunTicket) -> Self {
        Self { shared, ticket }
    }

    pub(crate) const fn token(&self) -> u64 {
        self.ticket.token
    }

    pub(crate) const fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub(crate) fn settings(&self) -> ExamSettings {
        self.shared.settings()
    }

    /// Lock the context and hand it to `f`, but only while this chain is
    /// still the live one.
    fn with_current<T>(&self, f: impl FnOnce(&mut ExamRunContext) -> T) -> Result<T, ExamError> {
        let mut ctx = self.shared.lock();
        if ctx.is_current(&self.ticket) {
            Ok(f(&mut ctx))
        } else {
            Err(ExamError::Aborted)
        }
    }

    pub(crate) fn ensure_current(&self) -> Result<(), ExamError> {
        self.with_current(|_| ())
    }

    pub(crate) fn material(&self) -> Result<Arc<RunMaterial>, ExamError> {
        self.with_current(|ctx| ctx.material.clone())?
            .ok_or(ExamError::NoDictationSelected)
    }

    // ── Narration and playback ─────────────────────────────────────────

    /// Fetch narration at the generation speed, so pre-generated entries
    /// are hit.
    pub(crate) async fn narrate(&self, text: &str) -> Result<NarrationAudio, ExamError> {
        self.ensure_current()?;
        let speed = self.settings().generation_speed;
        let audio = self
            .shared
            .narration
            .fetch(text, speed, &self.ticket.cancel)
            .await?;
        self.ensure_current()?;
        Ok(audio)
    }

    /// Play `audio` at `rate` and wait for it to end.
    ///
    /// Never starts while paused: the pause flag is checked under the same
    /// lock the pause operation takes.
    pub(crate) async fn play(&self, audio: &NarrationAudio, rate: f32) -> Result<(), ExamError> {
        let pending = loop {
            self.wait_for_resume().await?;
            if let Some(pending) = self.start_unless_paused(audio, rate)? {
                break pending;
            }
        };
        pending.finished(&self.ticket.cancel).await?;
        self.ensure_current()
    }

    fn start_unless_paused(
        &self,
        audio: &NarrationAudio,
        rate: f32,
    ) -> Result<Option<PendingPlayback>, ExamError> {
        let ctx = self.shared.lock();
        if !ctx.is_current(&self.ticket) {
            return Err(ExamError::Aborted);
        }
        if ctx.paused {
            return Ok(None);
        }
        Ok(Some(self.shared.playback.start(audio, rate)?))
    }

    pub(crate) async fn speak(&self, text: &str, rate: f32) -> Result<(), ExamError> {
        let audio = self.narrate(text).await?;
        self.play(&audio, rate).await
    }

    // ── Waiting ────────────────────────────────────────────────────────

    /// Sleep for `duration` unless the chain is superseded first.
    pub(crate) async fn pause_for(&self, duration: Duration) -> Result<(), ExamError> {
        self.ensure_current()?;
        tokio::select! {
            biased;
            () = self.ticket.cancel.cancelled() => return Err(ExamError::Aborted),
            () = tokio::time::sleep(duration) => {}
        }
        self.ensure_current()
    }

    /// Return once the run is not paused.
    pub(crate) async fn wait_for_resume(&self) -> Result<(), ExamError> {
        self.ensure_current()?;
        let mut paused = self.shared.paused.subscribe();
        let resumed = tokio::select! {
            biased;
            () = self.ticket.cancel.cancelled() => return Err(ExamError::Aborted),
            result = paused.wait_for(|paused| !*paused) => result.is_ok(),
        };
        if !resumed {
            return Err(ExamError::Internal("pause channel closed".into()));
        }
        self.ensure_current()
    }

    // ── State transitions ──────────────────────────────────────────────

    pub(crate) fn enter_phase(&self, phase: ExamPhase) -> Result<(), ExamError> {
        self.with_current(|ctx| {
            ctx.phase = phase;
            ctx.skip_in_progress = false;
            ctx.clear_reading();
            self.shared.emit(ExamEvent::PhaseChanged { phase });
        })?;
        trace!(token = self.token(), %phase, "Entered phase");
        Ok(())
    }

    pub(crate) fn begin_reading(
        &self,
        index: usize,
        total: usize,
        pass: ReadingPass,
        sentence: &str,
    ) -> Result<(), ExamError> {
        self.with_current(|ctx| {
            ctx.sentence_index = Some(index);
            ctx.reading_pass = Some(pass);
            self.shared.emit(ExamEvent::ReadingStarted {
                index,
                total,
                pass,
                sentence: sentence.to_string(),
            });
        })
    }

    pub(crate) fn end_readings(&self) -> Result<(), ExamError> {
        self.with_current(|ctx| {
            ctx.clear_reading();
            self.shared.emit(ExamEvent::ReadingsFinished);
        })
    }

    pub(crate) fn begin_intro(&self) -> Result<(), ExamError> {
        self.with_current(|ctx| {
            ctx.intro_active = true;
            ctx.intro_skipped = false;
        })
    }

    /// Close the intro window. Returns whether the user skipped it.
    pub(crate) fn end_intro(&self) -> Result<bool, ExamError> {
        self.with_current(|ctx| {
            ctx.intro_active = false;
            std::mem::take(&mut ctx.intro_skipped)
        })
    }

    pub(crate) fn intro_skipped(&self) -> Result<bool, ExamError> {
        self.with_current(|ctx| ctx.intro_skipped)
    }
}
