//! Conversion session: the encode, inspect, decide loop.
//!
//! Each session drives one request through the external engine, measures the
//! produced container's declared buffer demand, and consults the retry
//! ledger. A retry is a fresh iteration of the loop, never a nested
//! callback, so encode, inspect, and decide stay strictly sequential per
//! output path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bandcast_av::{synthesize, TranscodeEngine};
use bandcast_core::config::ConvertConfig;
use bandcast_core::{ConversionParams, Error, Result, MAX_RETRY};

use crate::convert::retry::{RetryLedger, Verdict};

/// Terminal and progress notifications for one conversion request.
///
/// `on_success` or `on_failure` fires exactly once per submission;
/// `on_progress` is best-effort and coarse. A caller that no longer wants
/// the result simply ignores its observer; the attempt in flight runs to
/// completion.
pub trait ConvertObserver: Send + Sync {
    fn on_start(&self) {}
    fn on_progress(&self, _percent: u8) {}
    fn on_success(&self, _output_path: &Path) {}
    fn on_failure(&self, _reason: &str) {}
}

/// Observer that discards every notification.
pub struct NoopObserver;

impl ConvertObserver for NoopObserver {}

/// Drives conversion requests against one engine and one retry ledger.
pub struct ConversionSession<E> {
    engine: Arc<E>,
    config: ConvertConfig,
    ledger: Arc<RetryLedger>,
}

impl<E: TranscodeEngine> ConversionSession<E> {
    /// Create a session with its own ledger.
    pub fn new(engine: Arc<E>, config: ConvertConfig) -> Self {
        let ledger = Arc::new(RetryLedger::new(config.buffer_size_limit));
        Self {
            engine,
            config,
            ledger,
        }
    }

    /// Create a session sharing a ledger with others, so concurrent sessions
    /// agree on which output paths are in flight.
    pub fn with_ledger(engine: Arc<E>, config: ConvertConfig, ledger: Arc<RetryLedger>) -> Self {
        Self {
            engine,
            config,
            ledger,
        }
    }

    /// The ledger backing this session.
    pub fn ledger(&self) -> Arc<RetryLedger> {
        Arc::clone(&self.ledger)
    }

    /// Convert one request to completion, retrying at lower quality while
    /// the produced file's declared buffer demand exceeds the device budget.
    ///
    /// Returns the output path on acceptance. Every terminal outcome is also
    /// reported through `observer`.
    pub async fn run(
        &self,
        params: ConversionParams,
        observer: &dyn ConvertObserver,
    ) -> Result<PathBuf> {
        if let Err(e) = params.validate() {
            observer.on_failure(&e.to_string());
            return Err(e);
        }

        let output = params.output_path.clone();
        if let Err(e) = self.ledger.begin(&output, params.quality) {
            observer.on_failure(&e.to_string());
            return Err(e);
        }

        observer.on_start();

        let mut quality = params.quality;
        let mut attempt: u32 = 0;
        loop {
            let request = params.clone().with_quality(quality);
            let args = synthesize(&request, &self.config);
            tracing::info!(
                "encode attempt {} at quality {} -> {}",
                attempt + 1,
                quality,
                output.display()
            );

            let report = match self.engine.run(&args).await {
                Ok(r) => r,
                Err(e) => return self.fail(&output, observer, e),
            };
            if !report.success {
                // Engine-level failure: the output is unreliable no matter
                // what is on disk, and lowering quality would not help.
                let err = Error::Tool {
                    tool: self.engine.name().to_string(),
                    message: report.diagnostic,
                };
                return self.fail(&output, observer, err);
            }
            observer.on_progress(progress_after_encode(attempt));

            if let Err(e) = require_non_empty(&output).await {
                return self.fail(&output, observer, e);
            }

            let inspect_path = output.clone();
            let joined =
                tokio::task::spawn_blocking(move || bandcast_probe::inspect(&inspect_path))
                    .await
                    .map_err(|e| Error::Internal(format!("inspection task failed: {e}")));
            let buffer_report = match joined {
                Ok(Ok(r)) => r,
                Ok(Err(probe_err)) => {
                    return self.fail(&output, observer, probe_error(probe_err))
                }
                Err(e) => return self.fail(&output, observer, e),
            };
            observer.on_progress(progress_after_inspect(attempt));
            tracing::debug!(
                "inspection of {}: {} header(s), max buffer {:?}",
                output.display(),
                buffer_report.found_headers,
                buffer_report.max_buffer_size
            );

            match self.ledger.evaluate(&output, &buffer_report) {
                Verdict::Accept => {
                    tracing::info!("accepted {} after {} attempt(s)", output.display(), attempt + 1);
                    observer.on_success(&output);
                    return Ok(output);
                }
                Verdict::Retry { quality: next } => {
                    tracing::info!(
                        "buffer size {:?} over limit {}; retrying at quality {next}",
                        buffer_report.max_buffer_size,
                        self.config.buffer_size_limit
                    );
                    // Retries always start from a clean file.
                    if let Err(e) = tokio::fs::remove_file(&output).await {
                        tracing::warn!(
                            "could not remove {} before retry: {e}",
                            output.display()
                        );
                    }
                    quality = next;
                    attempt += 1;
                }
                Verdict::Reject(err) => {
                    // The final over-limit file stays on disk for diagnostics;
                    // the caller must not treat it as valid.
                    observer.on_failure(&err.to_string());
                    return Err(err);
                }
            }
        }
    }

    fn fail(
        &self,
        output: &Path,
        observer: &dyn ConvertObserver,
        err: Error,
    ) -> Result<PathBuf> {
        self.ledger.abort(output);
        observer.on_failure(&err.to_string());
        Err(err)
    }
}

/// Inspector open/read failures are I/O failures of the whole attempt.
fn probe_error(err: bandcast_probe::AviProbeError) -> Error {
    match err {
        bandcast_probe::AviProbeError::FileNotFound(path) => Error::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output missing at inspection: {}", path.display()),
            ),
        },
        bandcast_probe::AviProbeError::Io(source) => Error::Io { source },
    }
}

/// A reported-success encode must leave a non-empty file behind.
async fn require_non_empty(path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| Error::Io {
        source: std::io::Error::new(
            e.kind(),
            format!("output missing after encode: {}", path.display()),
        ),
    })?;
    if meta.len() == 0 {
        return Err(Error::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("output empty after encode: {}", path.display()),
            ),
        });
    }
    Ok(())
}

// Coarse progress: each attempt contributes an encode step and an inspect
// step toward the worst-case attempt count.
fn progress_after_encode(attempt: u32) -> u8 {
    let span = (MAX_RETRY + 1) * 2;
    (((attempt * 2 + 1) * 100 / span).min(99)) as u8
}

fn progress_after_inspect(attempt: u32) -> u8 {
    let span = (MAX_RETRY + 1) * 2;
    (((attempt * 2 + 2) * 100 / span).min(99)) as u8
}
