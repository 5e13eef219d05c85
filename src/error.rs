use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotError {
    #[error("malformed response cache at {path}: {message}")]
    CacheCorrupt { path: Utf8PathBuf, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read query list at {0}")]
    InputRead(PathBuf),

    #[error("uniprot request failed: {0}")]
    Http(String),

    #[error("uniprot returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("malformed markup: {0}")]
    Markup(String),

    #[error("search results column {index} has no header label")]
    ColumnMismatch { index: usize },
}

impl AnnotError {
    /// Cache and filesystem failures terminate the run; everything else is
    /// caught per query so one bad query does not stop the batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnnotError::CacheCorrupt { .. }
                | AnnotError::Filesystem(_)
                | AnnotError::InputRead(_)
        )
    }
}
