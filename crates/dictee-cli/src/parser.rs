//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Oral dictation trainer for the French brevet.
///
/// Texts are read aloud by a narration server (`POST /api/tts`); start it
/// before running an exam.
#[derive(Debug, Parser)]
#[command(name = "dictee")]
#[command(about = "Train for the brevet dictation with a narrated exam")]
#[command(version)]
pub struct Cli {
    /// Base URL of the narration server
    #[arg(
        long = "backend-url",
        env = "DICTEE_BACKEND_URL",
        default_value = "http://localhost:3001",
        global = true
    )]
    pub backend_url: String,

    /// Narration request timeout, in seconds
    #[arg(
        long = "timeout",
        env = "DICTEE_TIMEOUT_SECS",
        default_value_t = 60,
        global = true
    )]
    pub timeout_secs: u64,

    /// Load dictation texts from this JSON file instead of the built-in bank
    #[arg(long = "bank", env = "DICTEE_BANK", global = true)]
    pub bank: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
