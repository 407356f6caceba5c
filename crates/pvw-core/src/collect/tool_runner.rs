//! External tool execution.
//!
//! Runs a command to completion, capturing stdout and stderr, with:
//! - Command validation (no shell metacharacters in the program name)
//! - A fixed `C` locale so tool output is stable
//! - An optional per-command timeout, after which the child is killed
//!
//! With no timeout configured a hung tool blocks only the calling thread,
//! which is always a controller task thread, never the event loop.

use pvw_common::CollectionError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, trace, warn};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Output from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Command that was executed.
    pub command: String,
    /// Arguments passed to the command.
    pub args: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Terminating signal, if any.
    pub signal: Option<i32>,
    pub duration: Duration,
    /// Whether the command was killed for running past its timeout.
    pub timed_out: bool,
}

impl ToolOutput {
    /// Get stdout as string (lossy UTF-8 conversion).
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as string (lossy UTF-8 conversion).
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Configuration for the tool runner.
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    /// Per-command timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Runs external commands on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    config: ToolConfig,
}

impl ToolRunner {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ToolConfig::default())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    /// Run `cmd` with `args` and capture its output.
    ///
    /// A nonzero exit is not an error here; callers decide which exit codes
    /// are meaningful. Spawn failures, signals and timeouts are errors.
    #[instrument(skip(self), fields(cmd = %cmd))]
    pub fn run_tool(&self, cmd: &str, args: &[&str]) -> Result<ToolOutput, CollectionError> {
        validate_command(cmd)?;

        debug!(command = %cmd, ?args, timeout = ?self.config.timeout, "running tool");
        let start = Instant::now();

        let mut child = Command::new(cmd)
            .args(args)
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CollectionError::CommandNotFound(cmd.to_string()),
                _ => CollectionError::SpawnFailed {
                    command: cmd.to_string(),
                    reason: e.to_string(),
                },
            })?;

        // Drain both pipes concurrently so a chatty tool never blocks on a full pipe.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let io_error = |e: std::io::Error| CollectionError::Io {
            command: cmd.to_string(),
            reason: e.to_string(),
        };
        let waited = match self.config.timeout {
            Some(timeout) => wait_with_deadline(&mut child, start + timeout),
            None => child.wait().map(|status| (status, false)),
        };
        let stdout = join_reader(stdout_reader).map_err(io_error)?;
        let stderr = join_reader(stderr_reader).map_err(io_error)?;
        let (status, timed_out) = waited.map_err(io_error)?;
        let duration = start.elapsed();

        if timed_out {
            warn!(command = %cmd, ?duration, "tool timed out");
            return Err(CollectionError::Timeout {
                command: cmd.to_string(),
                seconds: self.config.timeout.map(|t| t.as_secs()).unwrap_or(0),
            });
        }

        let signal = exit_signal(&status);
        if let Some(signal) = signal {
            warn!(command = %cmd, signal, "tool killed by signal");
            return Err(CollectionError::KilledBySignal {
                command: cmd.to_string(),
                signal,
            });
        }

        trace!(
            command = %cmd,
            exit_code = ?status.code(),
            stdout_bytes = stdout.len(),
            duration_ms = duration.as_millis() as u64,
            "tool execution complete"
        );

        Ok(ToolOutput {
            command: cmd.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            stdout,
            stderr,
            exit_code: status.code(),
            signal,
            duration,
            timed_out,
        })
    }

    /// Whether `name` resolves to an executable on PATH.
    pub fn is_on_path(&self, name: &str) -> bool {
        match self.run_tool("sh", &["-c", "command -v \"$1\"", "sh", name]) {
            Ok(output) => output.success() && !output.stdout_str().trim().is_empty(),
            Err(e) => {
                trace!(tool = name, error = %e, "PATH lookup failed");
                false
            }
        }
    }
}

/// Reject program names that could smuggle shell syntax.
fn validate_command(cmd: &str) -> Result<(), CollectionError> {
    if cmd.is_empty() || cmd.contains(['|', '&', ';', '$', '`', '\n', '\r']) {
        return Err(CollectionError::SpawnFailed {
            command: cmd.to_string(),
            reason: "invalid command name".to_string(),
        });
    }
    if cmd.starts_with('/') && !Path::new(cmd).exists() {
        return Err(CollectionError::CommandNotFound(cmd.to_string()));
    }
    Ok(())
}

/// Wait for `child`, killing it once `deadline` passes.
///
/// The kill goes through the unreaped `Child` handle, so it can only ever
/// reach this child. Returns the exit status and whether the kill was sent.
fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
) -> std::io::Result<(ExitStatus, bool)> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        let now = Instant::now();
        if now >= deadline {
            debug!(pid = child.id(), "tool timed out, killing");
            child.kill()?;
            return child.wait().map(|status| (status, true));
        }
        thread::sleep(WAIT_POLL_INTERVAL.min(deadline - now));
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> std::io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| std::io::Error::other("pipe reader panicked"))?,
        None => Ok(Vec::new()),
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_echo() {
        let runner = ToolRunner::with_defaults();
        let output = runner.run_tool("echo", &["hello", "world"]).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout_str().trim(), "hello world");
        assert!(!output.timed_out);
        assert_eq!(output.args, vec!["hello", "world"]);
    }

    #[test]
    fn test_run_with_stderr() {
        let runner = ToolRunner::with_defaults();
        let output = runner.run_tool("sh", &["-c", "echo oops >&2"]).unwrap();
        assert!(output.success());
        assert!(output.stderr_str().contains("oops"));
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let runner = ToolRunner::with_defaults();
        let output = runner.run_tool("sh", &["-c", "exit 42"]).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(42));
    }

    #[test]
    fn test_command_not_found() {
        let runner = ToolRunner::with_defaults();
        let err = runner
            .run_tool("/nonexistent/command/that/does/not/exist", &[])
            .unwrap_err();
        assert!(matches!(err, CollectionError::CommandNotFound(_)));
    }

    #[test]
    fn test_bare_command_not_found() {
        let runner = ToolRunner::with_defaults();
        let err = runner
            .run_tool("pvw-definitely-not-a-real-tool", &[])
            .unwrap_err();
        assert!(matches!(err, CollectionError::CommandNotFound(_)));
    }

    #[test]
    fn test_shell_metacharacters_rejected() {
        let runner = ToolRunner::with_defaults();
        let err = runner.run_tool("echo; rm -rf /", &[]).unwrap_err();
        assert!(matches!(err, CollectionError::SpawnFailed { .. }));
    }

    #[test]
    fn test_timeout_kills_command() {
        let runner = ToolRunner::new(ToolConfig {
            timeout: Some(Duration::from_millis(100)),
        });
        let start = Instant::now();
        let err = runner.run_tool("sleep", &["10"]).unwrap_err();
        assert!(matches!(err, CollectionError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_fast_command_under_timeout() {
        let runner = ToolRunner::new(ToolConfig {
            timeout: Some(Duration::from_secs(5)),
        });
        let output = runner.run_tool("echo", &["ok"]).unwrap();
        assert!(output.success());
        assert!(!output.timed_out);
    }

    #[test]
    fn test_exited_child_is_not_killed_at_deadline() {
        let mut child = Command::new("true").spawn().unwrap();
        // Let it exit without reaping it, then wait with a deadline already gone.
        thread::sleep(Duration::from_millis(200));
        let (status, killed) = wait_with_deadline(&mut child, Instant::now()).unwrap();
        assert!(!killed);
        assert!(status.success());
    }

    #[test]
    fn test_large_output_under_timeout() {
        let runner = ToolRunner::new(ToolConfig {
            timeout: Some(Duration::from_secs(10)),
        });
        let output = runner
            .run_tool("sh", &["-c", "head -c 200000 /dev/zero"])
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 200_000);
    }

    #[test]
    fn test_is_on_path() {
        let runner = ToolRunner::with_defaults();
        assert!(runner.is_on_path("sh"));
        assert!(!runner.is_on_path("pvw-definitely-not-a-real-tool"));
    }
}
