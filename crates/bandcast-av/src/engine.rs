//! The transcoding engine boundary.
//!
//! [`TranscodeEngine`] is the seam the conversion session is written
//! against; [`FfmpegEngine`] is the production implementation. Tests swap in
//! scripted engines to exercise the retry protocol without an encoder.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{EngineCommand, EngineReport};
use crate::tools::ToolRegistry;

/// An external engine that accepts an ordered argument list and completes
/// exactly once with a success flag and diagnostic text.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Name used in error messages ("ffmpeg" for the real engine).
    fn name(&self) -> &str {
        "engine"
    }

    /// Run one invocation to completion.
    ///
    /// A non-success [`EngineReport`] means the engine itself rejected the
    /// work; the output file must be treated as absent regardless of what
    /// exists on disk. `Err` is reserved for spawn/timeout/I-O failures.
    async fn run(&self, args: &[String]) -> bandcast_core::Result<EngineReport>;
}

/// Production engine: invokes the discovered ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegEngine {
    /// Build from a discovered registry entry.
    pub fn new(registry: &ToolRegistry, timeout: Duration) -> bandcast_core::Result<Self> {
        let tool = registry.require("ffmpeg")?;
        Ok(Self {
            program: tool.path.clone(),
            timeout,
        })
    }

    /// Build from an explicit binary path (used by tests and embedders).
    pub fn from_path(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(&self, args: &[String]) -> bandcast_core::Result<EngineReport> {
        EngineCommand::new(self.program.clone())
            .args(args.iter().cloned())
            .timeout(self.timeout)
            .run()
            .await
    }
}
