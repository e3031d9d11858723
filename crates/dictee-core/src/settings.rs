//! Exam pacing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Slowest playback rate the controller accepts.
pub const MIN_PLAYBACK_RATE: f32 = 0.5;

/// Fastest playback rate the controller accepts.
pub const MAX_PLAYBACK_RATE: f32 = 1.2;

/// Clamp a playback rate to `[MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE]`.
///
/// Non-finite input falls back to normal speed.
#[must_use]
pub fn clamp_playback_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        1.0
    }
}

// ── Settings ───────────────────────────────────────────────────────

/// User-tunable settings of an exam run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamSettings {
    /// Playback rate for the dictation text itself (full readings and
    /// sentence passes).
    pub dictation_speed: f32,

    /// Playback rate for phase announcements.
    pub announcement_rate: f32,

    /// Speed sent to the narration backend.
    ///
    /// Every segment is synthesised at this one speed so pre-generation and
    /// the live run hit the same cache keys; the user's pace is applied as a
    /// playback rate instead.
    pub generation_speed: f32,

    /// Playback rate for single-word previews.
    pub word_preview_rate: f32,

    /// Fixed delays between narration steps.
    pub timings: PhaseTimings,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            dictation_speed: 0.85,
            announcement_rate: 1.0,
            generation_speed: 1.0,
            word_preview_rate: 0.8,
            timings: PhaseTimings::default(),
        }
    }
}

impl ExamSettings {
    /// Set the dictation speed, clamped to the playable range.
    #[must_use]
    pub fn with_dictation_speed(mut self, speed: f32) -> Self {
        self.dictation_speed = clamp_playback_rate(speed);
        self
    }

    #[must_use]
    pub const fn with_timings(mut self, timings: PhaseTimings) -> Self {
        self.timings = timings;
        self
    }
}

// ── Timings ────────────────────────────────────────────────────────

/// Phase delays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTimings {
    /// Lecture 1: after the announcement, unless the intro was skipped.
    pub intro_settle_ms: u64,
    /// Lecture 1: after the full reading.
    pub after_full_reading_ms: u64,
    /// Dictée: after the announcement.
    pub dictee_lead_in_ms: u64,
    /// Dictée: between the two passes of a sentence.
    pub between_passes_ms: u64,
    /// Dictée: after the second pass of a sentence.
    pub after_second_pass_ms: u64,
    /// Dictée: after the last sentence.
    pub dictee_tail_ms: u64,
    /// Relecture: after the announcement.
    pub relecture_lead_in_ms: u64,
    /// Relecture: after the final reading.
    pub relecture_tail_ms: u64,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            intro_settle_ms: 1500,
            after_full_reading_ms: 2000,
            dictee_lead_in_ms: 2000,
            between_passes_ms: 2500,
            after_second_pass_ms: 3500,
            dictee_tail_ms: 2000,
            relecture_lead_in_ms: 1500,
            relecture_tail_ms: 2000,
        }
    }
}

impl PhaseTimings {
    #[must_use]
    pub const fn intro_settle(&self) -> Duration {
        Duration::from_millis(self.intro_settle_ms)
    }

    #[must_use]
    pub const fn after_full_reading(&self) -> Duration {
        Duration::from_millis(self.after_full_reading_ms)
    }

    #[must_use]
    pub const fn dictee_lead_in(&self) -> Duration {
        Duration::from_millis(self.dictee_lead_in_ms)
    }

    #[must_use]
    pub const fn between_passes(&self) -> Duration {
        Duration::from_millis(self.between_passes_ms)
    }

    #[must_use]
    pub const fn after_second_pass(&self) -> Duration {
        Duration::from_millis(self.after_second_pass_ms)
    }

    #[must_use]
    pub const fn dictee_tail(&self) -> Duration {
        Duration::from_millis(self.dictee_tail_ms)
    }

    #[must_use]
    pub const fn relecture_lead_in(&self) -> Duration {
        Duration::from_millis(self.relecture_lead_in_ms)
    }

    #[must_use]
    pub const fn relecture_tail(&self) -> Duration {
        Duration::from_millis(self.relecture_tail_ms)
    }

    /// Every delay set to zero. Useful for tests that only care about
    /// ordering.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            intro_settle_ms: 0,
            after_full_reading_ms: 0,
            dictee_lead_in_ms: 0,
            between_passes_ms: 0,
            after_second_pass_ms: 0,
            dictee_tail_ms: 0,
            relecture_lead_in_ms: 0,
            relecture_tail_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_clamped() {
        assert!((clamp_playback_rate(2.0) - 1.2).abs() < f32::EPSILON);
        assert!((clamp_playback_rate(0.1) - 0.5).abs() < f32::EPSILON);
        assert!((clamp_playback_rate(0.85) - 0.85).abs() < f32::EPSILON);
        assert!((clamp_playback_rate(f32::NAN) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: ExamSettings =
            serde_json::from_str(r#"{"dictation_speed": 0.7, "timings": {"between_passes_ms": 10}}"#)
                .unwrap();
        assert!((settings.dictation_speed - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.timings.between_passes(), Duration::from_millis(10));
        assert_eq!(settings.timings.after_second_pass(), Duration::from_millis(3500));
    }

    #[test]
    fn builder_clamps_speed() {
        let settings = ExamSettings::default().with_dictation_speed(3.0);
        assert!((settings.dictation_speed - MAX_PLAYBACK_RATE).abs() < f32::EPSILON);
    }
}
