//! Error types for bandcast-probe

use std::path::PathBuf;

/// Errors that can occur during stream-header inspection
#[derive(Debug, thiserror::Error)]
pub enum AviProbeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
