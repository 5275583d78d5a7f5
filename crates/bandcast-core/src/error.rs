//! Unified error type for the bandcast workspace.
//!
//! All crates funnel their failures into [`Error`]. The variants map onto the
//! conversion failure taxonomy: invalid requests, engine failures, I/O
//! failures, and the one retryable condition: the device buffer budget.

use std::fmt;

/// Unified error type covering all failure modes in bandcast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation. Raised before any engine invocation
    /// and never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed, or a reported-success encode left no usable
    /// output file. Never retried.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The external transcoding engine reported failure. The diagnostic text
    /// is passed through verbatim. Never retried.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Diagnostic output from the tool.
        message: String,
    },

    /// Container inspection failed at the parse level.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The produced container's declared buffer requirement exceeds the
    /// device limit and the retry budget is exhausted.
    #[error(
        "buffer size {measured} exceeds limit {limit} after {retries} retries (quality {quality})"
    )]
    BufferLimit {
        /// The largest `dwSuggestedBufferSize` measured on the final attempt.
        measured: u32,
        /// The device's per-stream buffer budget in bytes.
        limit: u32,
        /// Retries consumed before giving up.
        retries: u32,
        /// Quality value of the final attempt.
        quality: u32,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl fmt::Display) -> Self {
        Error::Validation(message.to_string())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// True for the one condition the conversion loop may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::BufferLimit { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
