//! lsof-backed port enumeration.
//!
//! Two invocations are used:
//! - `lsof -i -Pn -F cPnpLT` lists every process with an open internet
//!   socket in field-output form (see [`crate::parse`])
//! - `lsof -p <pid> -F n` lists one process's open files, including its
//!   working directory as an `fcwd` record

use super::tool_runner::ToolRunner;
use pvw_common::CollectionError;
use tracing::{debug, instrument};

/// lsof exits with this status when nothing matched the selection.
pub const LSOF_NO_RESULTS_EXIT: i32 = 1;

const ENUMERATE_ARGS: [&str; 4] = ["-i", "-Pn", "-F", "cPnpLT"];

/// Record marker preceding the working-directory path in `-F n` output.
const CWD_MARKER: &str = "fcwd\nn";

/// Source of raw port enumeration text.
///
/// Implementations are called from task threads, one call per refresh.
pub trait PortSource: Send + Sync {
    /// Enumerate processes holding network sockets.
    ///
    /// "Nothing found" is reported as empty text, not an error.
    fn collect(&self) -> Result<String, CollectionError>;

    /// Working directory of `pid`, or an empty string when none is reported.
    fn resolve_working_directory(&self, pid: u32) -> Result<String, CollectionError>;
}

/// [`PortSource`] that shells out to lsof.
#[derive(Debug, Clone)]
pub struct LsofSource {
    runner: ToolRunner,
    program: String,
}

impl LsofSource {
    pub fn new(runner: ToolRunner) -> Self {
        Self::with_program(runner, "lsof")
    }

    /// Use a specific lsof binary (absolute path or PATH name).
    pub fn with_program(runner: ToolRunner, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the configured lsof binary can be found.
    pub fn is_available(&self) -> bool {
        if self.program.starts_with('/') {
            std::path::Path::new(&self.program).exists()
        } else {
            self.runner.is_on_path(&self.program)
        }
    }
}

impl PortSource for LsofSource {
    #[instrument(skip(self), fields(program = %self.program))]
    fn collect(&self) -> Result<String, CollectionError> {
        let output = self.runner.run_tool(&self.program, &ENUMERATE_ARGS)?;
        match output.exit_code {
            Some(0) => Ok(output.stdout_str()),
            Some(LSOF_NO_RESULTS_EXIT) => {
                debug!("lsof reported no matching sockets");
                Ok(String::new())
            }
            code => Err(CollectionError::NonZeroExit {
                command: self.program.clone(),
                code: code.unwrap_or(-1),
                stderr: output.stderr_str(),
            }),
        }
    }

    #[instrument(skip(self), fields(program = %self.program))]
    fn resolve_working_directory(&self, pid: u32) -> Result<String, CollectionError> {
        let pid_arg = pid.to_string();
        let output = self
            .runner
            .run_tool(&self.program, &["-p", &pid_arg, "-F", "n"])?;
        if !output.success() {
            return Err(CollectionError::NonZeroExit {
                command: self.program.clone(),
                code: output.exit_code.unwrap_or(-1),
                stderr: output.stderr_str(),
            });
        }
        Ok(extract_working_directory(&output.stdout_str()))
    }
}

/// Pull the working directory out of `lsof -p <pid> -F n` output.
///
/// Returns an empty string when the output has no `fcwd` record.
pub fn extract_working_directory(output: &str) -> String {
    match output.split_once(CWD_MARKER) {
        Some((_, rest)) => rest.lines().next().unwrap_or_default().to_string(),
        None => String::new(),
    }
}
