//! Health command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_optional;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let health = match ctx.narration().health().await {
        Ok(health) => health,
        Err(err) => {
            tracing::debug!(error = %err, "Health request failed");
            return Err(CliError::Offline(ctx.backend_url().to_string()).into());
        }
    };

    println!("Narration server: {}", ctx.backend_url());
    println!("  status:     {}", format_optional(&health.status, "--"));
    println!("  tts engine: {}", if health.tts_reachable { "reachable" } else { "unreachable" });
    println!("  tts server: {}", format_optional(&health.tts_server, "--"));
    println!("  model:      {}", format_optional(&health.model, "--"));
    println!("  cache size: {}", format_optional(&health.cache_size, "--"));

    if !health.tts_reachable {
        return Err(CliError::Offline(ctx.backend_url().to_string()).into());
    }
    Ok(())
}
