//! Preview command handler.

use anyhow::Result;
use dictee_core::ExamSettings;

use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext, word: &str, silent: bool) -> Result<()> {
    let (exam, _events) = ctx.orchestrator(ExamSettings::default(), silent)?;
    println!("Reading \"{}\"...", word.trim());
    exam.preview_word(word).await?;
    Ok(())
}
