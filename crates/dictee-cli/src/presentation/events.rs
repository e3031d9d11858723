//! One-line renderings of exam events.

use dictee_core::{ExamEvent, ExamPhase, ReadingPass};

use super::tables::format_elapsed;

/// Print the elapsed time once every this many seconds.
const CLOCK_EVERY_SECS: u64 = 60;

const fn phase_title(phase: ExamPhase) -> &'static str {
    match phase {
        ExamPhase::Idle => "Exam stopped",
        ExamPhase::Lecture1 => "Phase 1: full reading, listen without writing",
        ExamPhase::Dictee => "Phase 2: dictation, write each sentence",
        ExamPhase::Relecture => "Phase 3: proofreading, check your copy",
        ExamPhase::Finished => "Exam finished",
    }
}

/// What to show for `event`, if anything.
pub fn describe_event(event: &ExamEvent) -> Option<String> {
    let line = match event {
        ExamEvent::DictationSelected {
            title, sentences, ..
        } => format!("Selected \"{title}\" ({sentences} sentences)"),
        ExamEvent::NarrationStatus { available: true } => "Narration server ready".to_string(),
        ExamEvent::NarrationStatus { available: false } => {
            "Narration server unreachable".to_string()
        }
        ExamEvent::PregenerationProgress { completed, total } => {
            format!("Preparing audio {completed}/{total}")
        }
        ExamEvent::PregenerationFinished {
            completed,
            failed,
            total,
            skipped,
        } => {
            let mut line = if *skipped {
                format!("Audio preparation skipped at {completed}/{total}")
            } else {
                format!("Audio ready ({completed}/{total})")
            };
            if *failed > 0 {
                line.push_str(&format!(", {failed} segment(s) will be fetched live"));
            }
            line
        }
        ExamEvent::PhaseChanged { phase } => format!("== {} ==", phase_title(*phase)),
        ExamEvent::ReadingStarted {
            index,
            total,
            pass,
            sentence,
        } => {
            let reading = match pass {
                ReadingPass::First => "1st",
                ReadingPass::Second => "2nd",
            };
            format!("[{}/{total}] ({reading} reading) {sentence}", index + 1)
        }
        ExamEvent::ReadingsFinished => "All sentences read.".to_string(),
        ExamEvent::IntroSkipped => "Introduction skipped".to_string(),
        ExamEvent::Paused => "Paused (r to resume)".to_string(),
        ExamEvent::Resumed => "Resumed".to_string(),
        ExamEvent::Tick { elapsed } => {
            let secs = elapsed.as_secs();
            if secs == 0 || secs % CLOCK_EVERY_SECS != 0 {
                return None;
            }
            format!("({} elapsed)", format_elapsed(*elapsed))
        }
        ExamEvent::Finished { elapsed } => {
            format!("Done in {}.", format_elapsed(*elapsed))
        }
        ExamEvent::RunFailed { message } => format!("Exam halted: {message}"),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_reading_is_one_based() {
        let line = describe_event(&ExamEvent::ReadingStarted {
            index: 0,
            total: 6,
            pass: ReadingPass::Second,
            sentence: "Il pleuvait.".into(),
        })
        .unwrap();
        assert_eq!(line, "[1/6] (2nd reading) Il pleuvait.");
    }

    #[test]
    fn test_ticks_are_throttled() {
        let tick = |secs| ExamEvent::Tick {
            elapsed: Duration::from_secs(secs),
        };
        assert_eq!(describe_event(&tick(59)), None);
        assert_eq!(describe_event(&tick(120)), Some("(02:00 elapsed)".into()));
    }

    #[test]
    fn test_skipped_preparation_mentions_failures() {
        let line = describe_event(&ExamEvent::PregenerationFinished {
            completed: 3,
            failed: 1,
            total: 12,
            skipped: true,
        })
        .unwrap();
        assert!(line.starts_with("Audio preparation skipped at 3/12"));
        assert!(line.contains("1 segment(s)"));
    }
}
