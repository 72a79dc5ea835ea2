//! Builder for executing external tool commands.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// Commands run to completion and are awaited without a deadline unless
/// [`timeout`](ToolCommand::timeout) is set.
///
/// # Example
///
/// ```no_run
/// use sc_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> sc_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-hide_banner")
///     .arg("-version")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
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

    /// Set (or clear) the maximum execution time.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments collected so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Returns [`sc_core::Error::Tool`] if spawning the process fails.
    /// - Returns [`sc_core::Error::Tool`] if the process exits with a non-zero
    ///   status (message includes stderr).
    /// - Returns [`sc_core::Error::Tool`] if a timeout is set and expires; the
    ///   child is killed.
    pub async fn execute(&self) -> sc_core::Result<ToolOutput> {
        let program_name = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(tool = %program_name, args = ?self.args, "spawning tool");

        let child = cmd.spawn().map_err(|e| {
            sc_core::Error::tool(program_name.clone(), format!("failed to spawn: {e}"))
        })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(res) => res,
                // Dropping the future drops the child, and kill_on_drop reaps it.
                Err(_elapsed) => {
                    return Err(sc_core::Error::tool(
                        program_name,
                        format!("timed out after {limit:?}"),
                    ));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| {
            sc_core::Error::tool(
                program_name.clone(),
                format!("I/O error waiting for process: {e}"),
            )
        })?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            let detail = tool_output.stderr.trim();
            let detail = if detail.is_empty() {
                tool_output.stdout.trim()
            } else {
                detail
            };
            return Err(sc_core::Error::tool(
                program_name,
                format!("exited with status {}: {}", output.status, detail),
            ));
        }

        Ok(tool_output)
    }
}
