//! Simulated playback: a tokio timer sized from the WAV header.

use std::io::Cursor;
use std::time::Duration;

use dictee_core::{ActiveVoice, AudioOutput, NarrationAudio, PlaybackEnd, PlaybackError};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use super::OutputError;

/// Length of a WAV payload at normal speed.
pub fn wav_duration(audio: &NarrationAudio) -> Result<Duration, OutputError> {
    let reader = hound::WavReader::new(Cursor::new(audio.bytes().clone()))
        .map_err(|e| OutputError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(OutputError::Decode("sample rate is zero".into()));
    }
    // `duration()` counts frames (samples per channel).
    let frames = u64::from(reader.duration());
    Ok(Duration::from_micros(
        frames.saturating_mul(1_000_000) / u64::from(spec.sample_rate),
    ))
}

/// [`AudioOutput`] that "plays" by waiting out the narration's duration.
///
/// Pausing freezes the remaining time; the end callback fires once the
/// clock reaches zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedOutput;

impl TimedOutput {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AudioOutput for TimedOutput {
    fn start(
        &self,
        audio: &NarrationAudio,
        rate: f32,
        on_end: PlaybackEnd,
    ) -> Result<Box<dyn ActiveVoice>, PlaybackError> {
        let length = wav_duration(audio)?;
        let remaining = length.div_f32(rate.max(f32::EPSILON));
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| OutputError::NoRuntime)?;

        let (commands, rx) = mpsc::unbounded_channel();
        runtime.spawn(async move {
            if run_clock(remaining, rx).await {
                on_end(Ok(()));
            }
        });

        debug!(duration_ms = remaining.as_millis(), "Timed voice started");
        Ok(Box::new(TimedVoice { commands }))
    }
}

#[derive(Debug, Clone, Copy)]
enum ClockCommand {
    Pause,
    Resume,
    Stop,
}

struct TimedVoice {
    commands: mpsc::UnboundedSender<ClockCommand>,
}

impl ActiveVoice for TimedVoice {
    fn pause(&self) {
        let _ = self.commands.send(ClockCommand::Pause);
    }

    fn resume(&self) {
        let _ = self.commands.send(ClockCommand::Resume);
    }

    fn stop(&self) {
        let _ = self.commands.send(ClockCommand::Stop);
    }
}

/// Count `remaining` down, honouring pause/resume. Returns `true` on
/// natural end, `false` when stopped or when the voice was dropped.
async fn run_clock(
    mut remaining: Duration,
    mut commands: mpsc::UnboundedReceiver<ClockCommand>,
) -> bool {
    let mut paused = false;
    loop {
        if paused {
            match commands.recv().await {
                Some(ClockCommand::Resume) => paused = false,
                Some(ClockCommand::Pause) => {}
                Some(ClockCommand::Stop) | None => return false,
            }
            continue;
        }

        let started = Instant::now();
        tokio::select! {
            () = tokio::time::sleep(remaining) => return true,
            command = commands.recv() => {
                remaining = remaining.saturating_sub(started.elapsed());
                match command {
                    Some(ClockCommand::Pause) => paused = true,
                    Some(ClockCommand::Resume) => {}
                    Some(ClockCommand::Stop) | None => return false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn wav(seconds: u32) -> NarrationAudio {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..(8000 * seconds) {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        NarrationAudio::new(cursor.into_inner())
    }

    fn flag_callback() -> (Arc<AtomicBool>, PlaybackEnd) {
        let ended = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ended);
        let on_end: PlaybackEnd = Box::new(move |result: Result<(), String>| {
            assert!(result.is_ok());
            flag.store(true, Ordering::SeqCst);
        });
        (ended, on_end)
    }

    #[test]
    fn duration_comes_from_the_header() {
        assert_eq!(wav_duration(&wav(2)).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn non_wav_payload_is_a_decode_error() {
        let err = wav_duration(&NarrationAudio::new(&b"ID3 mp3 data"[..])).unwrap_err();
        assert!(matches!(err, OutputError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn ends_after_scaled_duration() {
        let (ended, on_end) = flag_callback();
        let _voice = TimedOutput.start(&wav(2), 0.5, on_end).unwrap();

        tokio::time::sleep(Duration::from_millis(3900)).await;
        assert!(!ended.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(ended.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_the_clock() {
        let (ended, on_end) = flag_callback();
        let voice = TimedOutput.start(&wav(1), 1.0, on_end).unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        voice.pause();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!ended.load(Ordering::SeqCst));

        voice.resume();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(ended.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_never_fires_the_callback() {
        let (ended, on_end) = flag_callback();
        let voice = TimedOutput.start(&wav(1), 1.0, on_end).unwrap();

        voice.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!ended.load(Ordering::SeqCst));
    }
}
