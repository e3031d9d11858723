//! Position-wise transcript scoring.
//!
//! A deliberately simple comparator: words are compared by index, so one
//! missing word shifts every following word into a mismatch.

use serde::{Deserialize, Serialize};

/// Maximum mark of a dictation.
pub const MAX_SCORE: f32 = 10.0;

/// Points deducted per mismatched word.
pub const POINTS_PER_FAULT: f32 = 0.25;

/// A word that differs from the original at the same position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMismatch {
    /// Zero-based word position.
    pub position: usize,
    /// What the student wrote, `None` when the transcript is shorter.
    pub student: Option<String>,
    /// What the original says, `None` for extra words.
    pub original: Option<String>,
}

/// Result of comparing a transcript with the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub score: f32,
    pub correct: usize,
    pub total_words: usize,
    pub fault_points: f32,
    pub mismatches: Vec<WordMismatch>,
    /// The transcript was blank; nothing was compared.
    pub empty: bool,
}

/// Score a student transcript against the original text.
#[must_use]
pub fn score_transcript(student: &str, original: &str) -> ScoreReport {
    let original_words = normalized_words(original);

    if student.trim().is_empty() {
        return ScoreReport {
            score: 0.0,
            correct: 0,
            total_words: original_words.len(),
            fault_points: 0.0,
            mismatches: Vec::new(),
            empty: true,
        };
    }

    let student_words = normalized_words(student);
    let len = student_words.len().max(original_words.len());

    let mut correct = 0;
    let mut mismatches = Vec::new();
    for position in 0..len {
        let written = student_words.get(position);
        let expected = original_words.get(position);
        if comparable(written) == comparable(expected) {
            correct += 1;
        } else {
            mismatches.push(WordMismatch {
                position,
                student: written.cloned(),
                original: expected.cloned(),
            });
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let fault_points = mismatches.len() as f32 * POINTS_PER_FAULT;

    ScoreReport {
        score: (MAX_SCORE - fault_points).max(0.0),
        correct,
        total_words: original_words.len(),
        fault_points,
        mismatches,
        empty: false,
    }
}

/// Unify typographic apostrophes and quotes, then split on whitespace.
fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .map(|c| match c {
                    '\u{2018}' | '\u{2019}' => '\'',
                    '\u{201C}' | '\u{201D}' | '«' | '»' => '"',
                    other => other,
                })
                .collect()
        })
        .collect()
}

/// Lowercase and strip sentence punctuation for comparison.
fn comparable(word: Option<&String>) -> String {
    word.map(|w| {
        w.to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '…'))
            .collect()
    })
    .unwrap_or_default()
}
