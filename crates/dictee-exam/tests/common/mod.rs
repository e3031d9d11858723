//! Shared fixtures for the orchestrator integration tests.
//!
//! Audio goes through [`TimedOutput`], so every "playback" is a tokio timer
//! and the tests run on paused time.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dictee_core::{
    BackendHealth, Dictation, ExamEvent, ExamSettings, NarrationBackend, NarrationError,
};
use dictee_exam::{ExamOrchestrator, TimedOutput};
use dictee_narration::NarrationService;
use tokio::sync::mpsc;

pub const THREE_SENTENCES: &str = "Le village dormait encore. Une charrette passa, lente et lourde. \
     Personne ne se retourna !";

pub const FOUR_SENTENCES: &str = "Il pleuvait. Le chemin montait vers la ferme. \
     Les chiens aboyaient ; personne ne répondait. Enfin, la porte s'ouvrit.";

pub fn dictation(text: &str) -> Dictation {
    Dictation {
        id: 7,
        title: "Le village".into(),
        author: "Marcel Pagnol".into(),
        work: None,
        year: None,
        theme: None,
        difficulty: 2,
        text: text.into(),
        rules: Vec::new(),
    }
}

/// A silent mono WAV of the given length.
pub fn wav(length: Duration) -> Bytes {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = u32::try_from(length.as_millis() * 8).unwrap();
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    Bytes::from(cursor.into_inner())
}

// ── Scripted backend ─────────────────────────────────────────────────────────

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Narrates everything as a one-second clip and records what it was asked.
pub struct ScriptedBackend {
    clip: Bytes,
    fail: bool,
    reachable: bool,
    requests: Mutex<Vec<String>>,
    on_call: OnceLock<CallHook>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            clip: wav(Duration::from_secs(1)),
            fail: false,
            reachable: true,
            requests: Mutex::new(Vec::new()),
            on_call: OnceLock::new(),
        }
    }

    /// Every synthesis fails with a server error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Health reports the TTS engine as unreachable.
    pub fn offline() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Answers every synthesis with bytes that are not audio.
    pub fn garbled() -> Self {
        Self {
            clip: Bytes::from_static(b"<html>not audio</html>"),
            ..Self::new()
        }
    }

    /// Run `hook` with the 1-based call number on every synthesis.
    pub fn on_call(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        assert!(self.on_call.set(Box::new(hook)).is_ok(), "hook already set");
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrationBackend for ScriptedBackend {
    async fn synthesize(&self, text: &str, _speed: f32) -> Result<Bytes, NarrationError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(text.to_string());
            requests.len()
        };
        if let Some(hook) = self.on_call.get() {
            hook(call);
        }
        if self.fail {
            Err(NarrationError::Unavailable("TTS synthesis failed".into()))
        } else {
            Ok(self.clip.clone())
        }
    }

    async fn health(&self) -> Result<BackendHealth, NarrationError> {
        Ok(BackendHealth {
            status: Some("ok".into()),
            tts_reachable: self.reachable,
            ..BackendHealth::default()
        })
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub exam: ExamOrchestrator,
    pub events: mpsc::UnboundedReceiver<ExamEvent>,
    pub backend: Arc<ScriptedBackend>,
}

impl Harness {
    /// Harness whose backend already passed the health check.
    pub async fn new(backend: ScriptedBackend) -> Self {
        let harness = Self::unchecked(backend);
        harness.exam.check_narration().await;
        harness
    }

    /// Harness that never probed the backend.
    pub fn unchecked(backend: ScriptedBackend) -> Self {
        let backend = Arc::new(backend);
        let narration = Arc::new(NarrationService::new(
            Arc::clone(&backend) as Arc<dyn NarrationBackend>
        ));
        let (exam, events) = ExamOrchestrator::new(
            narration,
            Arc::new(TimedOutput::new()),
            ExamSettings::default(),
        );
        Self {
            exam,
            events,
            backend,
        }
    }

    /// Harness with `text` already selected.
    pub async fn with_text(text: &str) -> Self {
        let harness = Self::new(ScriptedBackend::new()).await;
        harness.exam.select_dictation(dictation(text));
        harness
    }

    /// Receive events until one matches.
    pub async fn next_matching(&mut self, pred: impl Fn(&ExamEvent) -> bool) -> ExamEvent {
        let wait = async {
            loop {
                let event = self.events.recv().await.expect("event channel closed");
                if pred(&event) {
                    return event;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(3600), wait)
            .await
            .expect("timed out waiting for event")
    }

    /// Everything already emitted, ticks excluded.
    pub fn drain(&mut self) -> Vec<ExamEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if !matches!(event, ExamEvent::Tick { .. }) {
                events.push(event);
            }
        }
        events
    }
}
