//! Keyboard controls read from stdin during an exam, one per line.

use dictee_exam::ExamOrchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    SkipPhase,
    SkipIntro,
    SkipPregeneration,
    Quit,
    Help,
}

impl Control {
    /// Parse one input line. Blank lines and unknown keys give `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "n" | "next" => Some(Self::SkipPhase),
            "i" | "intro" => Some(Self::SkipIntro),
            "s" | "skip" => Some(Self::SkipPregeneration),
            "q" | "quit" => Some(Self::Quit),
            "h" | "help" | "?" => Some(Self::Help),
            _ => None,
        }
    }

    /// Apply the control to `exam`. Returns whether it had an effect.
    pub fn apply(self, exam: &ExamOrchestrator) -> bool {
        match self {
            Self::Pause => exam.pause(),
            Self::Resume => exam.resume(),
            // The returned handle is not needed: progress shows up as events.
            Self::SkipPhase => exam.skip_phase().is_some(),
            Self::SkipIntro => exam.skip_intro(),
            Self::SkipPregeneration => exam.skip_pregeneration(),
            Self::Quit => {
                exam.reset();
                true
            }
            Self::Help => false,
        }
    }
}

pub const HELP: &str = "\
Controls (type a letter then Enter):
  p  pause          r  resume
  n  next phase     i  skip the introduction
  s  skip audio preparation
  q  quit the exam  h  this help";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_letters_and_words() {
        assert_eq!(Control::parse("p"), Some(Control::Pause));
        assert_eq!(Control::parse(" R \n"), Some(Control::Resume));
        assert_eq!(Control::parse("next"), Some(Control::SkipPhase));
        assert_eq!(Control::parse("?"), Some(Control::Help));
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        assert_eq!(Control::parse(""), None);
        assert_eq!(Control::parse("x"), None);
        assert_eq!(Control::parse("pp"), None);
    }
}
