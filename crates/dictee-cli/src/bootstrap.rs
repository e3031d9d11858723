//! CLI bootstrap - the composition root.
//!
//! The only place where infrastructure is wired together: the content
//! bank, the HTTP narration backend with its cache, and the audio output
//! handed to each exam.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dictee_core::{ContentBank, Dictation, ExamEvent, ExamSettings};
use dictee_exam::{ExamOrchestrator, TimedOutput};
use dictee_narration::{HttpNarrationBackend, NarrationClientConfig, NarrationService};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::parser::Cli;

const BUILTIN_BANK: &str = include_str!("../data/dictees.json");

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Narration server base URL.
    pub backend_url: String,
    /// Per-request narration timeout.
    pub timeout: Duration,
    /// External bank file; the built-in bank when `None`.
    pub bank_path: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            backend_url: cli.backend_url.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
            bank_path: cli.bank.clone(),
        }
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    bank: ContentBank,
    narration: Arc<NarrationService>,
    backend_url: String,
}

impl CliContext {
    pub const fn bank(&self) -> &ContentBank {
        &self.bank
    }

    pub fn dictation(&self, id: u32) -> Result<&Dictation, CliError> {
        self.bank.get(id).ok_or(CliError::UnknownDictation(id))
    }

    pub const fn narration(&self) -> &Arc<NarrationService> {
        &self.narration
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// A fresh exam engine over the shared narration service.
    ///
    /// `silent` simulates playback timing. Builds without the `local-audio`
    /// feature always simulate.
    pub fn orchestrator(
        &self,
        settings: ExamSettings,
        silent: bool,
    ) -> Result<(ExamOrchestrator, mpsc::UnboundedReceiver<ExamEvent>)> {
        let output = audio_output(silent)?;
        Ok(ExamOrchestrator::new(
            Arc::clone(&self.narration),
            output,
            settings,
        ))
    }
}

#[cfg(feature = "local-audio")]
fn audio_output(silent: bool) -> Result<Arc<dyn dictee_core::AudioOutput>> {
    if silent {
        return Ok(Arc::new(TimedOutput::new()));
    }
    Ok(Arc::new(dictee_exam::RodioOutput::open()?))
}

#[cfg(not(feature = "local-audio"))]
fn audio_output(silent: bool) -> Result<Arc<dyn dictee_core::AudioOutput>> {
    if !silent {
        tracing::warn!("Built without the local-audio feature, playback is simulated");
    }
    Ok(Arc::new(TimedOutput::new()))
}

/// Load the content bank from `path`, or the built-in one.
pub fn load_bank(path: Option<&PathBuf>) -> Result<ContentBank, CliError> {
    let Some(path) = path else {
        return Ok(ContentBank::from_json(BUILTIN_BANK)?);
    };
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(ContentBank::from_json(&json)?)
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let bank = load_bank(config.bank_path.as_ref())?;

    let client = NarrationClientConfig::new()
        .with_base_url(&config.backend_url)
        .with_timeout(config.timeout);
    let backend = HttpNarrationBackend::new(client)?;
    let narration = Arc::new(NarrationService::new(Arc::new(backend)));

    tracing::debug!(
        backend = %config.backend_url,
        dictations = bank.len(),
        "CLI context ready"
    );
    Ok(CliContext {
        bank,
        narration,
        backend_url: config.backend_url,
    })
}
