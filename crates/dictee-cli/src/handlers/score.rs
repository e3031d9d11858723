//! Score command handler.

use std::path::Path;

use anyhow::Result;
use dictee_core::score_transcript;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Mismatches listed before the rest is summarised.
const MAX_LISTED: usize = 20;

pub fn execute(ctx: &CliContext, id: u32, transcript: &Path) -> Result<()> {
    let dictation = ctx.dictation(id)?;
    let student = std::fs::read_to_string(transcript).map_err(|source| CliError::Io {
        path: transcript.to_path_buf(),
        source,
    })?;

    let report = score_transcript(&student, &dictation.text);
    if report.empty {
        println!("The transcript is empty, nothing to mark.");
        return Ok(());
    }

    println!(
        "Score: {:.2}/10  ({} of {} words correct, -{:.2} points)",
        report.score, report.correct, report.total_words, report.fault_points
    );

    for mismatch in report.mismatches.iter().take(MAX_LISTED) {
        let wrote = mismatch.student.as_deref().unwrap_or("(missing)");
        let expected = mismatch.original.as_deref().unwrap_or("(extra word)");
        println!("  word {:>3}: wrote \"{wrote}\", expected \"{expected}\"", mismatch.position + 1);
    }
    if report.mismatches.len() > MAX_LISTED {
        println!("  ... and {} more", report.mismatches.len() - MAX_LISTED);
    }

    println!("\nSee 'dictee rules {id}' for the grammar points of this text.");
    Ok(())
}
