//! Playback controller: the single owner of the active narration voice.
//!
//! At most one voice is active system-wide. Starting a new one always stops
//! the previous one first. Completion is modelled as an awaitable
//! [`PendingPlayback`] backed by a one-shot channel held in a single slot:
//!
//! ```text
//!   Idle ──start──▶ Playing ──pause──▶ Paused
//!    ▲                 │ ◀──resume────── │
//!    └──end / stop─────┴─────────────────┘
//! ```
//!
//! Every slot entry carries a monotonically increasing id. Late callbacks
//! from a voice that has since been replaced compare ids and do nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dictee_core::{ActiveVoice, AudioOutput, NarrationAudio, PlaybackError, clamp_playback_rate};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// How [`PlaybackController::stop`] settles the pending completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopMode {
    /// Resolve it: an expected interruption, the caller moves on.
    Complete,
    /// Reject it with the given error.
    Reject(PlaybackError),
}

type Completion = oneshot::Sender<Result<(), PlaybackError>>;

struct ActivePlayback {
    id: u64,
    /// `None` between slot insertion and the output returning the voice.
    voice: Option<Box<dyn ActiveVoice>>,
    state: PlaybackState,
    done: Option<Completion>,
}

type Slot = Arc<Mutex<Option<ActivePlayback>>>;

/// Plays one narration at a time through an [`AudioOutput`].
pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    slot: Slot,
    next_id: AtomicU64,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Play `audio` at `rate` and wait for it to end.
    ///
    /// Resolves on natural end or on a [`StopMode::Complete`] stop. When
    /// `cancel` fires first, the voice is stopped and
    /// [`PlaybackError::Aborted`] returned.
    pub async fn play(
        &self,
        audio: &NarrationAudio,
        rate: f32,
        cancel: &CancellationToken,
    ) -> Result<(), PlaybackError> {
        if cancel.is_cancelled() {
            return Err(PlaybackError::Aborted);
        }
        self.start(audio, rate)?.finished(cancel).await
    }

    /// Start `audio` at `rate` (clamped to the playable range) and return
    /// its completion.
    ///
    /// Whatever was active is stopped first and its completion resolved.
    pub fn start(&self, audio: &NarrationAudio, rate: f32) -> Result<PendingPlayback, PlaybackError> {
        self.stop(StopMode::Complete);

        let rate = clamp_playback_rate(rate);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (done_tx, done_rx) = oneshot::channel();

        // Insert before starting so a synchronous end callback finds its entry.
        let previous = self.lock().replace(ActivePlayback {
            id,
            voice: None,
            state: PlaybackState::Playing,
            done: Some(done_tx),
        });
        if let Some(previous) = previous {
            settle(previous, Ok(()));
        }

        let on_end = {
            let slot = Arc::clone(&self.slot);
            Box::new(move |result: Result<(), String>| {
                finish_if_current(&slot, id, result.map_err(PlaybackError::Failed));
            })
        };

        match self.output.start(audio, rate, on_end) {
            Ok(voice) => {
                let orphan = {
                    let mut slot = self.lock();
                    match slot.as_mut() {
                        Some(active) if active.id == id => {
                            active.voice = Some(voice);
                            None
                        }
                        // Already ended or replaced.
                        _ => Some(voice),
                    }
                };
                if let Some(voice) = orphan {
                    voice.stop();
                }
            }
            Err(err) => {
                take_if_current(&self.slot, id);
                return Err(err);
            }
        }

        debug!(id, rate, bytes = audio.len(), "Playback started");
        Ok(PendingPlayback {
            id,
            slot: Arc::clone(&self.slot),
            done: done_rx,
        })
    }

    /// Suspend the active voice. No-op unless something is playing.
    pub fn pause(&self) {
        let mut slot = self.lock();
        if let Some(active) = slot.as_mut() {
            if active.state == PlaybackState::Playing {
                if let Some(voice) = &active.voice {
                    voice.pause();
                }
                active.state = PlaybackState::Paused;
                debug!(id = active.id, "Playback paused");
            }
        }
    }

    /// Continue the active voice. No-op unless something is paused.
    pub fn resume(&self) {
        let mut slot = self.lock();
        if let Some(active) = slot.as_mut() {
            if active.state == PlaybackState::Paused {
                if let Some(voice) = &active.voice {
                    voice.resume();
                }
                active.state = PlaybackState::Playing;
                debug!(id = active.id, "Playback resumed");
            }
        }
    }

    /// Halt the active voice and settle its completion according to `mode`.
    pub fn stop(&self, mode: StopMode) {
        let taken = self.lock().take();
        if let Some(active) = taken {
            debug!(id = active.id, ?mode, "Playback stopped");
            let result = match mode {
                StopMode::Complete => Ok(()),
                StopMode::Reject(err) => Err(err),
            };
            settle(active, result);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.lock()
            .as_ref()
            .map_or(PlaybackState::Idle, |active| active.state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActivePlayback>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Completion of a started playback.
#[must_use = "dropping the pending playback leaves the voice running unobserved"]
pub struct PendingPlayback {
    id: u64,
    slot: Slot,
    done: oneshot::Receiver<Result<(), PlaybackError>>,
}

impl PendingPlayback {
    /// Wait for the playback to settle, or for `cancel` to fire.
    ///
    /// On cancellation the voice is stopped if it is still the active one.
    pub async fn finished(self, cancel: &CancellationToken) -> Result<(), PlaybackError> {
        let Self { id, slot, done } = self;
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if let Some(active) = take_if_current(&slot, id) {
                    settle(active, Err(PlaybackError::Aborted));
                }
                Err(PlaybackError::Aborted)
            }
            result = done => result.unwrap_or(Err(PlaybackError::Aborted)),
        }
    }
}

/// Stop the voice (if any) and send the completion (if still pending).
fn settle(mut active: ActivePlayback, result: Result<(), PlaybackError>) {
    if let Some(voice) = active.voice.take() {
        voice.stop();
    }
    if let Some(done) = active.done.take() {
        let _ = done.send(result);
    }
}

fn take_if_current(slot: &Slot, id: u64) -> Option<ActivePlayback> {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().is_some_and(|active| active.id == id) {
        slot.take()
    } else {
        None
    }
}

/// Natural end or resource error reported by the output.
fn finish_if_current(slot: &Slot, id: u64, result: Result<(), PlaybackError>) {
    let Some(mut active) = take_if_current(slot, id) else {
        debug!(id, "Ignoring end of a superseded voice");
        return;
    };
    // The voice already ended on its own; stopping it again is pointless.
    active.voice = None;
    if let Err(err) = &result {
        debug!(id, error = %err, "Playback failed");
    }
    settle(active, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictee_core::PlaybackEnd;
    use std::sync::atomic::AtomicUsize;

    /// Output whose voices only end when the test says so.
    #[derive(Default)]
    struct ManualOutput {
        ends: Mutex<Vec<Option<PlaybackEnd>>>,
        rates: Mutex<Vec<f32>>,
        stops: Arc<AtomicUsize>,
        pauses: Arc<AtomicUsize>,
        fail_start: bool,
    }

    impl ManualOutput {
        fn end(&self, index: usize, result: Result<(), String>) {
            let end = self.ends.lock().unwrap()[index].take().unwrap();
            end(result);
        }
    }

    struct ManualVoice {
        stops: Arc<AtomicUsize>,
        pauses: Arc<AtomicUsize>,
    }

    impl ActiveVoice for ManualVoice {
        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
        fn resume(&self) {}
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AudioOutput for ManualOutput {
        fn start(
            &self,
            _audio: &NarrationAudio,
            rate: f32,
            on_end: PlaybackEnd,
        ) -> Result<Box<dyn ActiveVoice>, PlaybackError> {
            if self.fail_start {
                return Err(PlaybackError::Failed("not a WAV file".into()));
            }
            self.rates.lock().unwrap().push(rate);
            self.ends.lock().unwrap().push(Some(on_end));
            Ok(Box::new(ManualVoice {
                stops: Arc::clone(&self.stops),
                pauses: Arc::clone(&self.pauses),
            }))
        }
    }

    fn audio() -> NarrationAudio {
        NarrationAudio::new(&b"RIFF"[..])
    }

    fn controller() -> (PlaybackController, Arc<ManualOutput>) {
        let output = Arc::new(ManualOutput::default());
        (PlaybackController::new(output.clone()), output)
    }

    #[tokio::test]
    async fn natural_end_resolves() {
        let (controller, output) = controller();
        let pending = controller.start(&audio(), 1.0).unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);

        output.end(0, Ok(()));

        assert_eq!(pending.finished(&CancellationToken::new()).await, Ok(()));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn resource_error_rejects_with_failed() {
        let (controller, output) = controller();
        let pending = controller.start(&audio(), 1.0).unwrap();

        output.end(0, Err("corrupt stream".into()));

        assert_eq!(
            pending.finished(&CancellationToken::new()).await,
            Err(PlaybackError::Failed("corrupt stream".into()))
        );
    }

    #[tokio::test]
    async fn rate_is_clamped() {
        let (controller, output) = controller();
        let _first = controller.start(&audio(), 3.0).unwrap();
        let _second = controller.start(&audio(), 0.1).unwrap();
        assert_eq!(*output.rates.lock().unwrap(), vec![1.2, 0.5]);
    }

    #[tokio::test]
    async fn starting_a_new_voice_stops_and_resolves_the_previous_one() {
        let (controller, output) = controller();
        let first = controller.start(&audio(), 1.0).unwrap();
        let second = controller.start(&audio(), 1.0).unwrap();

        assert_eq!(first.finished(&CancellationToken::new()).await, Ok(()));
        assert_eq!(output.stops.load(Ordering::SeqCst), 1);

        // A late end from the first voice must not settle the second.
        output.end(0, Ok(()));
        assert_eq!(controller.state(), PlaybackState::Playing);

        output.end(1, Ok(()));
        assert_eq!(second.finished(&CancellationToken::new()).await, Ok(()));
    }

    #[tokio::test]
    async fn stop_with_reject_propagates_reason() {
        let (controller, _output) = controller();
        let pending = controller.start(&audio(), 1.0).unwrap();

        controller.stop(StopMode::Reject(PlaybackError::Aborted));

        assert_eq!(
            pending.finished(&CancellationToken::new()).await,
            Err(PlaybackError::Aborted)
        );
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn cancellation_stops_the_voice() {
        let (controller, output) = controller();
        let token = CancellationToken::new();
        let pending = controller.start(&audio(), 1.0).unwrap();

        token.cancel();

        assert_eq!(pending.finished(&token).await, Err(PlaybackError::Aborted));
        assert_eq!(output.stops.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn play_with_cancelled_token_never_starts() {
        let (controller, output) = controller();
        let token = CancellationToken::new();
        token.cancel();

        let result = controller.play(&audio(), 1.0, &token).await;

        assert_eq!(result, Err(PlaybackError::Aborted));
        assert!(output.ends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pause_and_resume_only_touch_the_active_voice() {
        let (controller, output) = controller();
        controller.pause();
        controller.resume();
        assert_eq!(output.pauses.load(Ordering::SeqCst), 0);

        let _pending = controller.start(&audio(), 1.0).unwrap();
        controller.pause();
        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(output.pauses.load(Ordering::SeqCst), 1);

        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn start_failure_leaves_controller_idle() {
        let output = Arc::new(ManualOutput {
            fail_start: true,
            ..ManualOutput::default()
        });
        let controller = PlaybackController::new(output);

        let result = controller.play(&audio(), 1.0, &CancellationToken::new()).await;

        assert!(matches!(result, Err(PlaybackError::Failed(_))));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }
}
