use crate::app::template::FormatError;
use thiserror::Error;

/// Failures surfaced to whatever drives a [`PathChecker`](crate::app::checker::PathChecker).
#[derive(Debug, Error)]
pub enum Error {
    /// `path` is unset or empty; the checker cannot run.
    #[error("missing path")]
    MissingPath,

    #[error("invalid format: {0}")]
    Format(#[from] FormatError),
}
