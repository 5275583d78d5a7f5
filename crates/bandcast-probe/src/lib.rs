//! # bandcast-probe
//!
//! Byte-level AVI stream-header inspection.
//!
//! The peripheral that consumes bandcast's output enforces a hard per-stream
//! decode buffer budget, and the only place the encoder declares its buffer
//! demand is the `dwSuggestedBufferSize` field inside each `strh` chunk.
//! This crate locates those chunks by scanning the file's leading bytes and
//! reports the largest plausible value, without demuxing or external tools.
//!
//! ## Example
//!
//! ```no_run
//! let report = bandcast_probe::inspect("clip.avi").unwrap();
//!
//! match report.max_buffer_size {
//!     Some(size) => println!("declared buffer demand: {size} bytes"),
//!     None => println!("no buffer size declared"),
//! }
//! ```

pub mod avi;
pub mod error;

pub use avi::{StreamBufferReport, CANDIDATE_OFFSETS, HEADER_SCAN_WINDOW, MAX_PLAUSIBLE, MIN_PLAUSIBLE};
pub use error::AviProbeError;

use std::path::Path;

/// Inspect a produced container file. See [`avi::inspect`].
pub fn inspect(path: impl AsRef<Path>) -> Result<StreamBufferReport, AviProbeError> {
    avi::inspect(path.as_ref())
}
