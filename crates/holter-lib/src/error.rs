use thiserror::Error;

/// Errors raised by the review workflow.
///
/// Duration rejections are not errors; see [`crate::selection::Rejection`].
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Input table is missing a required column, holds a malformed value,
    /// or contains no samples.
    #[error("format error: {0}")]
    Format(String),

    /// Out-of-bounds window, slice or annotation index.
    #[error("range error: {0}")]
    Range(String),

    /// Operation requested from a session state that does not allow it.
    #[error("cannot {operation} while session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    /// Figure rasterization or document rendering failed.
    #[error("report error: {0}")]
    Report(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReviewError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
