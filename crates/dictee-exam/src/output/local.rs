//! Real playback through `rodio` on the default output device.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on a
//! dedicated OS thread for the lifetime of the output. Only the
//! `OutputStreamHandle` (used to create sinks) leaves that thread.
//!
//! Each voice gets its own `Sink` plus a watcher thread blocked in
//! `sleep_until_end`; the watcher fires the end callback unless the voice
//! was stopped first.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

use dictee_core::{ActiveVoice, AudioOutput, NarrationAudio, PlaybackEnd, PlaybackError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, info};

use super::OutputError;

/// [`AudioOutput`] backed by the default audio device.
pub struct RodioOutput {
    handle: OutputStreamHandle,
    /// Dropping this sender ends the stream-owner thread.
    _keep_alive: mpsc::Sender<()>,
}

impl RodioOutput {
    /// Open the default output device on a dedicated thread.
    pub fn open() -> Result<Self, PlaybackError> {
        let (init_tx, init_rx) = mpsc::channel::<Result<OutputStreamHandle, OutputError>>();
        let (keep_alive, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("dictee-audio".into())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = init_tx.send(Err(OutputError::Device(e.to_string())));
                        return;
                    }
                };
                if init_tx.send(Ok(handle)).is_err() {
                    return;
                }
                // Blocks until every sender is dropped.
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Audio output thread exiting");
            })
            .map_err(|e| OutputError::Device(format!("failed to spawn audio thread: {e}")))?;

        let handle = init_rx
            .recv()
            .map_err(|_| OutputError::Device("audio thread died during init".into()))??;

        info!("Audio playback initialized on default output device");
        Ok(Self {
            handle,
            _keep_alive: keep_alive,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn start(
        &self,
        audio: &NarrationAudio,
        rate: f32,
        on_end: PlaybackEnd,
    ) -> Result<Box<dyn ActiveVoice>, PlaybackError> {
        let source = Decoder::new(Cursor::new(audio.bytes().clone()))
            .map_err(|e| OutputError::Decode(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| OutputError::Device(e.to_string()))?;
        sink.set_speed(rate);
        sink.append(source);

        let voice = RodioVoice {
            sink: Arc::new(sink),
            stopped: Arc::new(AtomicBool::new(false)),
        };
        voice.spawn_completion_watcher(on_end);
        Ok(Box::new(voice))
    }
}

struct RodioVoice {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
}

impl RodioVoice {
    fn spawn_completion_watcher(&self, on_end: PlaybackEnd) {
        let sink = Arc::clone(&self.sink);
        let stopped = Arc::clone(&self.stopped);

        // `sleep_until_end` returns early once `stop` drops the queued sources.
        thread::spawn(move || {
            sink.sleep_until_end();
            if stopped.swap(true, Ordering::SeqCst) {
                return;
            }
            debug!("Playback finished naturally");
            on_end(Ok(()));
        });
    }
}

impl ActiveVoice for RodioVoice {
    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}
