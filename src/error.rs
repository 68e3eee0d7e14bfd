//! Error types shared by the extraction pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures surfaced by rule loading, input reading, and partition writing.
///
/// Per-report degradations (absent text, zero matches) are not errors; they
/// become sentinel rows inside the extractor.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("input error in {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },
    #[error("failed to write partition '{label}' to {}: {reason}", path.display())]
    Write {
        label: String,
        path: PathBuf,
        reason: String,
    },
    #[error("extraction worker failed: {0}")]
    Worker(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    pub(crate) fn input(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Input {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(label: &str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            label: label.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
