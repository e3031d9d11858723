//! Domain types for the dictation exam.

mod announcements;
mod dictation;
mod phase;
mod scoring;

pub use announcements::{PhaseAnnouncements, pregeneration_segments};
pub use dictation::{ContentBank, Dictation, GrammarRule, RuleCategory};
pub use phase::{ExamPhase, ReadingPass};
pub use scoring::{ScoreReport, WordMismatch, score_transcript};
