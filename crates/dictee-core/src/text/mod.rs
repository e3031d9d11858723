//! Text segmentation for the dictation protocol.
//!
//! Two pure functions drive the narration of a dictation text:
//!
//! - [`split_into_sentences`] cuts the full text "phrase par phrase".
//! - [`build_spoken_form`] rewrites a sentence so that every punctuation mark
//!   is replaced by its spoken name (`virgule`, `point`, ...).
//!
//! Neither function can fail.

mod punctuation;

pub use punctuation::PunctuationMark;

/// A piece of a tokenized sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpokenSegment<'a> {
    /// A trimmed, non-empty run of text between two marks.
    Text(&'a str),
    /// A punctuation mark from the fixed table.
    Mark(PunctuationMark),
}

/// Split a text into sentences.
///
/// A sentence ends at `.`, `!` or `?` immediately followed by whitespace or
/// the end of the text. The terminator stays attached to its sentence and
/// blank results are dropped.
#[must_use]
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let is_terminator =
            PunctuationMark::from_char(c).is_some_and(PunctuationMark::is_sentence_terminator);
        if !is_terminator {
            continue;
        }
        let followed_by_space = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if followed_by_space {
            let end = idx + c.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

/// Tokenize a sentence into text chunks and punctuation marks, in order.
///
/// Three consecutive dots are read as a single ellipsis. Characters outside
/// the fixed table (quotes, dashes, apostrophes) stay inside text chunks.
#[must_use]
pub fn tokenize(sentence: &str) -> Vec<SpokenSegment<'_>> {
    let mut segments = Vec::new();
    let mut chunk_start = 0;
    let mut idx = 0;

    while idx < sentence.len() {
        let rest = &sentence[idx..];
        let (mark, width) = if rest.starts_with("...") {
            (Some(PunctuationMark::Ellipsis), 3)
        } else {
            // idx always sits on a char boundary
            let c = rest.chars().next().unwrap_or_default();
            (PunctuationMark::from_char(c), c.len_utf8())
        };

        if let Some(mark) = mark {
            push_text(&mut segments, &sentence[chunk_start..idx]);
            segments.push(SpokenSegment::Mark(mark));
            chunk_start = idx + width;
        }
        idx += width;
    }
    push_text(&mut segments, &sentence[chunk_start..]);

    segments
}

/// The punctuation marks of a sentence, in reading order.
#[must_use]
pub fn punctuation_marks(sentence: &str) -> Vec<PunctuationMark> {
    tokenize(sentence)
        .into_iter()
        .filter_map(|segment| match segment {
            SpokenSegment::Mark(mark) => Some(mark),
            SpokenSegment::Text(_) => None,
        })
        .collect()
}

/// Build the spoken-punctuation form of a sentence.
///
/// Chunks and spoken marks are joined with `", "` and whitespace is
/// collapsed. The result is empty only when the sentence is blank; callers
/// should use [`spoken_form_or_raw`] to fall back to the raw sentence.
#[must_use]
pub fn build_spoken_form(sentence: &str) -> String {
    let parts: Vec<&str> = tokenize(sentence)
        .into_iter()
        .map(|segment| match segment {
            SpokenSegment::Text(text) => text,
            SpokenSegment::Mark(mark) => mark.spoken(),
        })
        .collect();

    collapse_whitespace(&parts.join(", "))
}

/// Spoken form of a sentence, or the sentence itself when the spoken form is
/// empty.
#[must_use]
pub fn spoken_form_or_raw(sentence: &str) -> String {
    let spoken = build_spoken_form(sentence);
    if spoken.is_empty() {
        sentence.to_string()
    } else {
        spoken
    }
}

/// Count the characters of a text, whitespace excluded ("signes sans les
/// espaces").
#[must_use]
pub fn count_signs(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Collapse every run of whitespace into a single space and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Internal helpers ───────────────────────────────────────────────

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

fn push_text<'a>(out: &mut Vec<SpokenSegment<'a>>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(SpokenSegment::Text(piece));
    }
}
