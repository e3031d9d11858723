//! The fixed punctuation table of the dictation-reading protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A punctuation mark the narrator announces aloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PunctuationMark {
    Comma,
    Semicolon,
    Colon,
    Period,
    QuestionMark,
    ExclamationMark,
    Ellipsis,
}

impl PunctuationMark {
    /// Every mark in the table.
    pub const ALL: [Self; 7] = [
        Self::Comma,
        Self::Semicolon,
        Self::Colon,
        Self::Period,
        Self::QuestionMark,
        Self::ExclamationMark,
        Self::Ellipsis,
    ];

    /// Map a single character to its mark. A run of three dots is handled by
    /// the tokenizer, not here.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Self::Comma),
            ';' => Some(Self::Semicolon),
            ':' => Some(Self::Colon),
            '.' => Some(Self::Period),
            '?' => Some(Self::QuestionMark),
            '!' => Some(Self::ExclamationMark),
            '…' => Some(Self::Ellipsis),
            _ => None,
        }
    }

    /// The glyph as written in the text (`…` for the normalized ellipsis).
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Colon => ':',
            Self::Period => '.',
            Self::QuestionMark => '?',
            Self::ExclamationMark => '!',
            Self::Ellipsis => '…',
        }
    }

    /// The word the narrator says in place of the mark.
    #[must_use]
    pub const fn spoken(self) -> &'static str {
        match self {
            Self::Comma => "virgule",
            Self::Semicolon => "point-virgule",
            Self::Colon => "deux-points",
            Self::Period => "point",
            Self::QuestionMark => "point d'interrogation",
            Self::ExclamationMark => "point d'exclamation",
            Self::Ellipsis => "points de suspension",
        }
    }

    /// Pause associated with the mark when pacing a reading.
    #[must_use]
    pub const fn pause(self) -> Duration {
        Duration::from_millis(match self {
            Self::Comma => 1100,
            Self::Semicolon | Self::Colon => 1400,
            Self::Period | Self::QuestionMark | Self::ExclamationMark => 1800,
            Self::Ellipsis => 2000,
        })
    }

    /// Whether the mark closes a sentence for segmentation purposes.
    #[must_use]
    pub const fn is_sentence_terminator(self) -> bool {
        matches!(self, Self::Period | Self::QuestionMark | Self::ExclamationMark)
    }
}
