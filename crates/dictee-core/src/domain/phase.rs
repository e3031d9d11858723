//! Exam phase state machine labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of an exam run.
///
/// ```text
///   Idle → Lecture1 → Dictee → Relecture → Finished
/// ```
///
/// Transitions are strictly forward; only an explicit reset returns to
/// `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamPhase {
    /// A text may be selected; no run is live.
    #[default]
    Idle,

    /// First, uninterrupted reading of the whole text.
    Lecture1,

    /// Sentence-by-sentence dictation, two passes per sentence.
    Dictee,

    /// Final continuous reading for proofreading.
    Relecture,

    /// Terminal; unlocks scoring.
    Finished,
}

impl ExamPhase {
    /// The phase that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Lecture1),
            Self::Lecture1 => Some(Self::Dictee),
            Self::Dictee => Some(Self::Relecture),
            Self::Relecture => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// The narrated phases from `self` (inclusive) up to, but excluding,
    /// `Finished`.
    #[must_use]
    pub fn narrated_from(self) -> Vec<Self> {
        let mut phases = Vec::new();
        let mut current = Some(self);
        while let Some(phase) = current {
            if phase.is_narrated() {
                phases.push(phase);
            }
            current = phase.next();
        }
        phases
    }

    /// Whether the phase reads something aloud.
    #[must_use]
    pub const fn is_narrated(self) -> bool {
        matches!(self, Self::Lecture1 | Self::Dictee | Self::Relecture)
    }

    /// Stable lowercase label (`"lecture1"`, `"dictee"`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Lecture1 => "lecture1",
            Self::Dictee => "dictee",
            Self::Relecture => "relecture",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two readings of a sentence is under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingPass {
    First,
    Second,
}

impl ReadingPass {
    /// Zero-based pass number.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_linearly() {
        assert_eq!(ExamPhase::Idle.next(), Some(ExamPhase::Lecture1));
        assert_eq!(ExamPhase::Relecture.next(), Some(ExamPhase::Finished));
        assert_eq!(ExamPhase::Finished.next(), None);
    }

    #[test]
    fn narrated_from_skips_terminal_states() {
        assert_eq!(
            ExamPhase::Lecture1.narrated_from(),
            vec![ExamPhase::Lecture1, ExamPhase::Dictee, ExamPhase::Relecture]
        );
        assert_eq!(ExamPhase::Relecture.narrated_from(), vec![ExamPhase::Relecture]);
        assert!(ExamPhase::Finished.narrated_from().is_empty());
    }

    #[test]
    fn serializes_as_lowercase_label() {
        let json = serde_json::to_string(&ExamPhase::Lecture1).unwrap();
        assert_eq!(json, "\"lecture1\"");
        assert_eq!(ExamPhase::Dictee.to_string(), "dictee");
    }
}
