//! Error taxonomy for the harness library.

use std::path::PathBuf;

/// Errors produced while preparing or driving a suite run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("malformed Exit: annotation {value:?}: {source}")]
    MalformedExpectation {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("failed to spawn {stage} stage ({program}): {source}")]
    Spawn {
        stage: String,
        program: String,
        source: std::io::Error,
    },

    #[error("{stage} stage timed out after {limit_secs} seconds")]
    StageTimeout { stage: String, limit_secs: u64 },

    #[error("stage {0} has an empty command")]
    EmptyCommand(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk fixture directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
