//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the dictation texts of the bank
    List,

    /// Check that the narration server is up and can synthesize
    Health,

    /// Show the grammar points to check for a dictation
    Rules {
        /// Dictation ID (see `dictee list`)
        id: u32,
    },

    /// Take a dictation exam: full reading, dictation, proofreading
    Run {
        /// Dictation ID (see `dictee list`)
        id: u32,
        /// Dictation reading speed (0.5 to 1.2)
        #[arg(long, env = "DICTEE_SPEED")]
        speed: Option<f32>,
        /// Simulate playback timing without sound
        #[arg(long)]
        silent: bool,
        /// Start right away without pre-generating the narration
        #[arg(long = "no-pregen")]
        no_pregen: bool,
    },

    /// Hear a single word read slowly
    Preview {
        word: String,
        /// Simulate playback timing without sound
        #[arg(long)]
        silent: bool,
    },

    /// Mark a transcript against the original text
    Score {
        /// Dictation ID (see `dictee list`)
        id: u32,
        /// File holding the transcript
        transcript: PathBuf,
    },
}
