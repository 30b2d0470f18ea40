//! git::runner
//!
//! Executes a single external command and captures its result.
//!
//! # Design
//!
//! A non-zero exit status is a normal [`CommandResult`], not an error: the
//! external tool reporting its own failure is information the caller
//! interprets. The only error this layer produces is [`RunnerError`], raised
//! when the process cannot be launched at all.
//!
//! Arguments are handed to the process as argv. Nothing goes through a
//! shell, so messages containing quotes, `$`, or backticks reach git
//! unchanged.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, trace};

/// Result of running an external command to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Process exit code (`-1` when terminated by a signal).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandResult {
    /// Create a result from its parts.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams joined, for pattern checks that may hit either one.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (_, true) => self.stdout.clone(),
            _ => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// The external process could not be started.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// Executable missing from PATH.
    #[error("'{program}' was not found; is it installed and on PATH?")]
    NotFound {
        /// Program that was requested
        program: String,
    },

    /// Executable exists but may not be run.
    #[error("permission denied when launching '{program}'")]
    PermissionDenied {
        /// Program that was requested
        program: String,
    },

    /// Any other launch or wait failure.
    #[error("failed to run '{program}': {message}")]
    Io {
        /// Program that was requested
        program: String,
        /// OS error text
        message: String,
    },
}

impl RunnerError {
    fn from_io(program: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => RunnerError::NotFound {
                program: program.to_string(),
            },
            io::ErrorKind::PermissionDenied => RunnerError::PermissionDenied {
                program: program.to_string(),
            },
            _ => RunnerError::Io {
                program: program.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Per-invocation options.
///
/// Environment overrides apply to exactly one invocation; nothing is
/// written to the parent process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Hand the terminal to the child instead of capturing its output.
    ///
    /// Used for editors, merge tools, and package installs. The returned
    /// result carries the exit code with empty streams.
    pub inherit_stdio: bool,
}

impl RunOptions {
    /// Options that run in `dir`.
    pub fn in_dir(dir: Option<&Path>) -> Self {
        Self {
            cwd: dir.map(Path::to_path_buf),
            ..Self::default()
        }
    }

    /// Add an environment override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Attach the child to the current terminal.
    pub fn interactive(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }
}

/// Runs external commands.
///
/// Implementations block until the command exits.
pub trait CommandRunner {
    /// Run `program` with `args` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] only when the process cannot be launched.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        options: &RunOptions,
    ) -> Result<CommandResult, RunnerError>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        options: &RunOptions,
    ) -> Result<CommandResult, RunnerError> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &options.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        debug!(program, ?args, cwd = ?options.cwd, "running command");

        if options.inherit_stdio {
            let status = cmd
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| RunnerError::from_io(program, &e))?;
            return Ok(CommandResult::new(
                status.code().unwrap_or(-1),
                String::new(),
                String::new(),
            ));
        }

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RunnerError::from_io(program, &e))?;

        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(
            program,
            exit_code = result.exit_code,
            stdout = %result.stdout,
            stderr = %result.stderr,
            "command finished"
        );
        Ok(result)
    }
}
