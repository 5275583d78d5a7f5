//! Adaptive conversion for the device's buffer budget.
//!
//! Video encoders cannot be told to stay under N kilobytes of per-frame
//! decode buffer, so this module encodes, inspects the produced container's
//! stream headers, and re-encodes at lower quality within strict bounds:
//!
//! - at most [`bandcast_core::MAX_RETRY`] retries per output path,
//! - quality never past [`bandcast_core::MAX_QUALITY`],
//! - only buffer-size violations are retried; engine and I/O failures are
//!   terminal on first occurrence.

mod retry;
mod session;

pub use retry::{RetryLedger, RetryState, Verdict};
pub use session::{ConversionSession, ConvertObserver, NoopObserver};
