use std::io;
use std::path::PathBuf;

use boardcheck_core::BoardError;
use thiserror::Error;

/// Failures while reading inputs or writing reports.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("cannot open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inconsistent board: {0}")]
    Board(#[from] BoardError),
}

impl IoError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IoError::Open {
            path: path.into(),
            source,
        }
    }
}
