//! CLI-specific error types and exit codes.

use std::path::PathBuf;

use dictee_core::{ContentError, ExamError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No dictation with ID {0}. Use 'dictee list' to see the available texts.")]
    UnknownDictation(u32),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dictation bank: {0}")]
    Content(#[from] ContentError),

    #[error("Narration server unreachable at {0}")]
    Offline(String),

    #[error("{0}")]
    Exam(#[from] ExamError),
}

impl CliError {
    /// Map error to a sysexits-style exit code.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownDictation(_) => 2, // EX_USAGE
            Self::Io { .. } => 74,          // EX_IOERR
            Self::Content(_) => 65,         // EX_DATAERR
            Self::Offline(_) => 69,         // EX_UNAVAILABLE
            Self::Exam(ExamError::NarrationOffline) => 69,
            Self::Exam(_) => 1,
        }
    }
}
