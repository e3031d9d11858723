//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Validate CLI input, call the engine, format output for the terminal
//!
//! Exam logic stays in `dictee-exam`; handlers only drive it.

pub mod health;
pub mod list;
pub mod preview;
pub mod rules;
pub mod run;
pub mod score;
