//! Execution of the external transcoding engine with timeout support.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

/// Default engine timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Completion report from one engine run.
///
/// A non-zero exit is a *reported* outcome, not an execution error: the
/// caller decides what to do with `diagnostic`. Only spawn, I/O, and timeout
/// failures surface as [`bandcast_core::Error`].
#[derive(Debug, Clone)]
pub struct EngineReport {
    /// Whether the engine exited with status zero.
    pub success: bool,
    /// Captured standard error (lossy UTF-8), passed through verbatim.
    pub diagnostic: String,
}

/// A builder for one invocation of the external engine.
///
/// # Example
///
/// ```no_run
/// use bandcast_av::EngineCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> bandcast_core::Result<()> {
/// let report = EngineCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-version")
///     .run()
///     .await?;
/// assert!(report.success);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl EngineCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Run the engine to completion, capturing stderr as the diagnostic.
    ///
    /// # Errors
    ///
    /// - [`bandcast_core::Error::Tool`] if spawning fails, if waiting on the
    ///   process fails, or if the timeout elapses.
    pub async fn run(&self) -> bandcast_core::Result<EngineReport> {
        let program_name = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string());

        tracing::debug!("running {} {:?}", program_name, self.args);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let child = cmd.spawn().map_err(|e| bandcast_core::Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => Ok(EngineReport {
                success: output.status.success(),
                diagnostic: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(bandcast_core::Error::Tool {
                tool: program_name,
                message: format!("I/O error waiting for process: {e}"),
            }),
            Err(_elapsed) => {
                // On timeout the future is cancelled and tokio reaps the child.
                Err(bandcast_core::Error::Tool {
                    tool: program_name,
                    message: format!("timed out after {:?}", self.timeout),
                })
            }
        }
    }
}
