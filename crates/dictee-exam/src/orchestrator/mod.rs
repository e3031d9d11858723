//! Exam orchestrator: drives a dictation run through its phases.
//!
//! ```text
//!   Idle → Lecture1 → Dictee → Relecture → Finished
//!     ▲                                        │
//!     └──────────────── reset ─────────────────┘
//! ```
//!
//! Each run (and each skip inside a run) is one causal chain of phase steps
//! on its own tokio task. A chain carries a ticket: the run token it was
//! started under and a cancellation signal. Skip, reset and new text bump
//! the token and fire the signal, so a superseded chain wakes up, sees it
//! is stale and unwinds with [`ExamError::Aborted`] without mutating
//! anything.
//!
//! Pause is cooperative. The active voice is suspended, and every chain
//! checks the pause flag before starting the next step, so no sentence
//! pass starts while paused. The elapsed-time ticker keeps counting.

mod context;
mod phases;
mod scope;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use dictee_core::{
    AudioOutput, Dictation, ExamError, ExamEvent, ExamPhase, ExamSettings, PlaybackError,
    ReadingPass, pregeneration_segments,
};
use dictee_narration::NarrationService;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::playback::{PlaybackController, PlaybackState, StopMode};
use crate::pregen::{PregenerationProgress, PregenerationState, PregenerationStatus, Pregenerator};
use context::{ExamRunContext, RunMaterial, RunTicket};
use scope::RunScope;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ── Run outcome ────────────────────────────────────────────────────────

/// How one causal chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The chain reached the end of the relecture and finished the exam.
    Finished,
    /// A skip, reset or new text took over before the chain ended.
    Superseded,
    /// Narration or playback failed; the run is halted.
    Failed(ExamError),
}

/// A spawned chain of phase steps.
#[must_use = "dropping the handle detaches the run; it keeps going"]
pub struct RunHandle {
    token: u64,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Run token the chain was started under.
    pub const fn token(&self) -> u64 {
        self.token
    }

    /// Wait for the chain to end.
    pub async fn settled(self) -> RunOutcome {
        self.task
            .await
            .unwrap_or_else(|err| RunOutcome::Failed(ExamError::Internal(err.to_string())))
    }
}

// ── Snapshot ───────────────────────────────────────────────────────────

/// Point-in-time view of the orchestrator, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSnapshot {
    pub dictation_id: Option<u32>,
    pub phase: ExamPhase,
    /// Zero-based, dictée phase only.
    pub sentence_index: Option<usize>,
    pub sentence_count: usize,
    pub reading_pass: Option<ReadingPass>,
    pub paused: bool,
    pub run_token: u64,
    pub exam_in_progress: bool,
    pub skip_in_progress: bool,
    pub elapsed: Option<Duration>,
    pub pregeneration: Option<PregenerationProgress>,
    pub playback: PlaybackState,
    pub narration_available: Option<bool>,
    pub can_start: bool,
}

// ── Shared state ───────────────────────────────────────────────────────

pub(crate) struct Shared {
    pub(crate) narration: Arc<NarrationService>,
    pub(crate) playback: PlaybackController,
    settings: RwLock<ExamSettings>,
    /// Lock order: this context first, then the playback slot.
    ctx: Mutex<ExamRunContext>,
    /// Mirrors `ExamRunContext::paused` for chains waiting on resume.
    pub(crate) paused: watch::Sender<bool>,
    events: mpsc::UnboundedSender<ExamEvent>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, ExamRunContext> {
        self.ctx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn settings(&self) -> ExamSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn emit(&self, event: ExamEvent) {
        // The receiver going away only means nobody is watching.
        let _ = self.events.send(event);
    }
}

// ── Orchestrator ───────────────────────────────────────────────────────

/// The exam engine. Cheap to clone; clones drive the same exam.
#[derive(Clone)]
pub struct ExamOrchestrator {
    shared: Arc<Shared>,
}

impl ExamOrchestrator {
    /// Create an orchestrator and the receiver for its events.
    pub fn new(
        narration: Arc<NarrationService>,
        output: Arc<dyn AudioOutput>,
        settings: ExamSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ExamEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (paused, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            narration,
            playback: PlaybackController::new(output),
            settings: RwLock::new(settings),
            ctx: Mutex::new(ExamRunContext::default()),
            paused,
            events,
        });
        (Self { shared }, events_rx)
    }

    // ── Narration backend ──────────────────────────────────────────────

    /// Probe the narration backend and record whether it can narrate.
    ///
    /// Until a probe succeeds, [`start`](Self::start) and
    /// [`pregenerate`](Self::pregenerate) are refused.
    pub async fn check_narration(&self) -> bool {
        let available = match self.shared.narration.health().await {
            Ok(health) => {
                info!(
                    status = ?health.status,
                    tts_reachable = health.tts_reachable,
                    model = ?health.model,
                    "Narration backend health"
                );
                health.tts_reachable
            }
            Err(err) => {
                warn!(error = %err, "Narration backend health check failed");
                false
            }
        };
        self.shared.lock().narration_online = Some(available);
        self.shared.emit(ExamEvent::NarrationStatus { available });
        available
    }

    pub fn narration(&self) -> &Arc<NarrationService> {
        &self.shared.narration
    }

    // ── Text selection ─────────────────────────────────────────────────

    /// Make `dictation` the current text.
    ///
    /// Abandons any live run, cancels pre-generation and empties the
    /// narration cache.
    pub fn select_dictation(&self, dictation: Dictation) {
        let material = Arc::new(RunMaterial::new(dictation));
        let (id, title, sentences) = (
            material.dictation.id,
            material.dictation.title.clone(),
            material.sentences.len(),
        );
        {
            let mut ctx = self.shared.lock();
            self.abandon(&mut ctx);
            if let Some(pregen) = ctx.pregeneration.take() {
                pregen.cancel();
            }
            ctx.material = Some(material);
            self.shared.emit(ExamEvent::DictationSelected {
                id,
                title: title.clone(),
                sentences,
            });
        }
        let released = self.shared.narration.clear_cache();
        info!(id, title = %title, sentences, released, "Dictation selected");
    }

    /// Abandon everything and forget the current text.
    pub fn go_home(&self) {
        let mut ctx = self.shared.lock();
        self.abandon(&mut ctx);
        if let Some(pregen) = ctx.pregeneration.take() {
            pregen.cancel();
        }
        ctx.material = None;
        drop(ctx);
        info!("Returned home");
    }

    // ── Pre-generation ─────────────────────────────────────────────────

    /// Warm the narration cache with every segment the run will need.
    ///
    /// Runs until every segment was attempted, a skip is requested or the
    /// text changes. Start is refused meanwhile unless a skip was
    /// requested. Needs a passing [`check_narration`](Self::check_narration).
    pub async fn pregenerate(&self) -> Result<PregenerationProgress, ExamError> {
        let (segments, state) = {
            let mut ctx = self.shared.lock();
            if ctx.exam_in_progress {
                return Err(ExamError::ExamInProgress);
            }
            let material = ctx
                .material
                .clone()
                .ok_or(ExamError::NoDictationSelected)?;
            if ctx.narration_online != Some(true) {
                return Err(ExamError::NarrationOffline);
            }
            if let Some(previous) = ctx.pregeneration.take() {
                previous.cancel();
            }
            let segments = pregeneration_segments(&material.dictation);
            let state = Arc::new(PregenerationState::new(segments.len()));
            ctx.pregeneration = Some(Arc::clone(&state));
            (segments, state)
        };

        let pregenerator = Pregenerator::new(
            Arc::clone(&self.shared.narration),
            self.shared.settings().generation_speed,
        );
        let shared = &self.shared;
        let progress = pregenerator
            .run(&segments, &state, |progress| {
                shared.emit(ExamEvent::PregenerationProgress {
                    completed: progress.completed,
                    total: progress.total,
                });
            })
            .await;

        if progress.status != PregenerationStatus::Cancelled {
            self.shared.emit(ExamEvent::PregenerationFinished {
                completed: progress.completed,
                failed: progress.failed,
                total: progress.total,
                skipped: progress.status == PregenerationStatus::Skipped,
            });
        }
        Ok(progress)
    }

    /// Stop pre-generation before its next segment and allow start right
    /// away. Returns `false` when nothing was running.
    pub fn skip_pregeneration(&self) -> bool {
        let requested = self
            .shared
            .lock()
            .pregeneration
            .as_ref()
            .is_some_and(|state| state.request_skip());
        if requested {
            info!("Pre-generation skip requested");
        }
        requested
    }

    // ── Run control ────────────────────────────────────────────────────

    /// Begin a run at phase 1.
    ///
    /// Returns `Ok(None)` when a run is already live or the exam has not
    /// been reset since it last ended.
    pub fn start(&self) -> Result<Option<RunHandle>, ExamError> {
        let runtime = Handle::try_current().map_err(|err| ExamError::Internal(err.to_string()))?;
        let mut ctx = self.shared.lock();
        if ctx.exam_in_progress || ctx.phase != ExamPhase::Idle {
            warn!(phase = %ctx.phase, "Start ignored: an exam is already under way");
            return Ok(None);
        }
        if let Some(err) = ctx.start_blocker() {
            return Err(err);
        }

        let ticket = ctx.advance_token();
        let started_at = Instant::now();
        ctx.exam_in_progress = true;
        ctx.paused = false;
        ctx.intro_active = false;
        ctx.intro_skipped = false;
        ctx.started_at = Some(started_at);
        ctx.stop_ticker();
        ctx.ticker = Some(spawn_ticker(&runtime, self.shared.events.clone(), started_at));
        self.shared.paused.send_replace(false);
        drop(ctx);

        info!(token = ticket.token, "Exam started");
        Ok(Some(self.spawn_run(&runtime, ticket, ExamPhase::Lecture1)))
    }

    /// Suspend the run. Returns `false` when there is nothing to pause.
    pub fn pause(&self) -> bool {
        let mut ctx = self.shared.lock();
        if !ctx.exam_in_progress || ctx.paused {
            return false;
        }
        ctx.paused = true;
        self.shared.playback.pause();
        self.shared.paused.send_replace(true);
        self.shared.emit(ExamEvent::Paused);
        debug!(token = ctx.run_token, "Exam paused");
        true
    }

    /// Continue a paused run. Returns `false` when it was not paused.
    pub fn resume(&self) -> bool {
        let mut ctx = self.shared.lock();
        if !ctx.exam_in_progress || !ctx.paused {
            return false;
        }
        ctx.paused = false;
        self.shared.playback.resume();
        self.shared.paused.send_replace(false);
        self.shared.emit(ExamEvent::Resumed);
        debug!(token = ctx.run_token, "Exam resumed");
        true
    }

    /// Abandon the current phase and start the next one.
    ///
    /// Ignored (`None`) when no run is live or a skip is still settling.
    /// Skipping out of the relecture finishes the exam.
    pub fn skip_phase(&self) -> Option<RunHandle> {
        let runtime = Handle::try_current().ok()?;
        let mut ctx = self.shared.lock();
        if !ctx.exam_in_progress || ctx.skip_in_progress {
            debug!(skip_in_progress = ctx.skip_in_progress, "Skip ignored");
            return None;
        }
        let from = ctx.phase;
        if !from.is_narrated() {
            return None;
        }
        let target = from.next()?;

        let was_paused = ctx.paused;
        let ticket = ctx.advance_token();
        ctx.skip_in_progress = true;
        ctx.paused = false;
        ctx.intro_active = false;
        ctx.intro_skipped = false;
        ctx.clear_reading();
        self.shared
            .playback
            .stop(StopMode::Reject(PlaybackError::Aborted));
        self.shared.paused.send_replace(false);
        if was_paused {
            self.shared.emit(ExamEvent::Resumed);
        }
        drop(ctx);

        info!(%from, to = %target, token = ticket.token, "Skipping phase");
        Some(self.spawn_run(&runtime, ticket, target))
    }

    /// Cut the phase-1 announcement short. The full reading follows
    /// without the usual settle delay.
    pub fn skip_intro(&self) -> bool {
        let mut ctx = self.shared.lock();
        if ctx.phase != ExamPhase::Lecture1 || !ctx.intro_active || ctx.intro_skipped {
            return false;
        }
        ctx.intro_skipped = true;
        self.shared.playback.stop(StopMode::Complete);
        self.shared.emit(ExamEvent::IntroSkipped);
        drop(ctx);
        info!("Intro skipped");
        true
    }

    /// Abandon the run and go back to `Idle`, keeping the selected text.
    pub fn reset(&self) {
        let mut ctx = self.shared.lock();
        self.abandon(&mut ctx);
        drop(ctx);
        info!("Exam reset");
    }

    // ── Extras ─────────────────────────────────────────────────────────

    /// Narrate a single word, outside of any run.
    pub async fn preview_word(&self, word: &str) -> Result<(), ExamError> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(());
        }
        if self.shared.lock().exam_in_progress {
            return Err(ExamError::ExamInProgress);
        }
        let settings = self.shared.settings();
        let cancel = CancellationToken::new();
        let audio = self
            .shared
            .narration
            .fetch(word, settings.generation_speed, &cancel)
            .await?;
        self.shared
            .playback
            .play(&audio, settings.word_preview_rate, &cancel)
            .await?;
        Ok(())
    }

    /// Change the dictation reading speed. Applies from the next reading.
    /// Returns the clamped value.
    pub fn set_dictation_speed(&self, speed: f32) -> f32 {
        let mut settings = self
            .shared
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *settings = settings.clone().with_dictation_speed(speed);
        settings.dictation_speed
    }

    pub fn settings(&self) -> ExamSettings {
        self.shared.settings()
    }

    pub fn can_start(&self) -> bool {
        self.shared.lock().can_start()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.shared.playback.state()
    }

    pub fn snapshot(&self) -> ExamSnapshot {
        let ctx = self.shared.lock();
        ExamSnapshot {
            dictation_id: ctx.material.as_ref().map(|m| m.dictation.id),
            phase: ctx.phase,
            sentence_index: ctx.sentence_index,
            sentence_count: ctx.material.as_ref().map_or(0, |m| m.sentences.len()),
            reading_pass: ctx.reading_pass,
            paused: ctx.paused,
            run_token: ctx.run_token,
            exam_in_progress: ctx.exam_in_progress,
            skip_in_progress: ctx.skip_in_progress,
            elapsed: ctx.elapsed(),
            pregeneration: ctx.pregeneration.as_ref().map(|state| state.progress()),
            playback: self.shared.playback.state(),
            narration_available: ctx.narration_online,
            can_start: ctx.can_start(),
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Supersede the live chain and return to `Idle`.
    fn abandon(&self, ctx: &mut ExamRunContext) {
        let was = ctx.phase;
        ctx.advance_token();
        ctx.abandon_run();
        self.shared
            .playback
            .stop(StopMode::Reject(PlaybackError::Aborted));
        self.shared.paused.send_replace(false);
        if was != ExamPhase::Idle {
            self.shared.emit(ExamEvent::PhaseChanged {
                phase: ExamPhase::Idle,
            });
        }
    }

    fn spawn_run(&self, runtime: &Handle, ticket: RunTicket, from: ExamPhase) -> RunHandle {
        let token = ticket.token;
        let scope = RunScope::new(Arc::clone(&self.shared), ticket);
        RunHandle {
            token,
            task: runtime.spawn(phases::drive(scope, from)),
        }
    }
}

/// Emit [`ExamEvent::Tick`] once per second until aborted. Keeps counting
/// while paused.
fn spawn_ticker(
    runtime: &Handle,
    events: mpsc::UnboundedSender<ExamEvent>,
    started_at: Instant,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut interval = tokio::time::interval_at(started_at + TICK_INTERVAL, TICK_INTERVAL);
        loop {
            interval.tick().await;
            let tick = ExamEvent::Tick {
                elapsed: started_at.elapsed(),
            };
            if events.send(tick).is_err() {
                break;
            }
        }
    })
}
