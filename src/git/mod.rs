//! git
//!
//! The doorway to the local `git` binary.
//!
//! # Modules
//!
//! - [`runner`] - Launches external commands and captures their results
//! - [`parse`] - Per-query parsers for git's textual output
//! - [`inspector`] - Read-only repository state queries
//! - [`mock`] - Scripted runner for tests
//!
//! # Design
//!
//! Nothing outside this module spawns git directly. [`GitCli`] pins the
//! working directory and the environment every invocation shares:
//! `GIT_TERMINAL_PROMPT=0` so a missing credential fails instead of hanging,
//! and `LC_ALL=C` so the phrases the parsers look for are stable.

pub mod inspector;
pub mod mock;
pub mod parse;
pub mod runner;

pub use inspector::{InspectError, Inspector, RepoState};
pub use parse::{AheadBehind, Parsed};
pub use runner::{CommandResult, CommandRunner, RunOptions, RunnerError, SystemRunner};

use std::path::{Path, PathBuf};

/// Name of the git executable.
pub const GIT: &str = "git";

/// Git invocations bound to one working directory.
#[derive(Clone, Copy)]
pub struct GitCli<'a> {
    runner: &'a dyn CommandRunner,
    cwd: Option<&'a Path>,
}

impl std::fmt::Debug for GitCli<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli").field("cwd", &self.cwd).finish()
    }
}

impl<'a> GitCli<'a> {
    /// Bind a runner to a working directory (`None` means the process cwd).
    pub fn new(runner: &'a dyn CommandRunner, cwd: Option<&'a Path>) -> Self {
        Self { runner, cwd }
    }

    /// The underlying runner, for non-git programs in the same directory.
    pub fn runner(&self) -> &'a dyn CommandRunner {
        self.runner
    }

    /// Working directory override, if any.
    pub fn cwd(&self) -> Option<&'a Path> {
        self.cwd
    }

    /// Directory commands run in, falling back to the process cwd.
    pub fn work_dir(&self) -> PathBuf {
        self.cwd
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Base options shared by every git call.
    pub fn options(&self) -> RunOptions {
        RunOptions::in_dir(self.cwd)
            .with_env("GIT_TERMINAL_PROMPT", "0")
            .with_env("LC_ALL", "C")
    }

    /// Run `git <args>`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if git cannot be launched.
    pub fn run(&self, args: &[&str]) -> Result<CommandResult, RunnerError> {
        self.runner.run(GIT, args, &self.options())
    }

    /// Run `git <args>` with extra environment for this call only.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if git cannot be launched.
    pub fn run_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandResult, RunnerError> {
        let options = env
            .iter()
            .fold(self.options(), |opts, (k, v)| opts.with_env(*k, *v));
        self.runner.run(GIT, args, &options)
    }

    /// Run `git <args>` attached to the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if git cannot be launched.
    pub fn run_interactive(&self, args: &[&str]) -> Result<CommandResult, RunnerError> {
        self.runner
            .run(GIT, args, &self.options().interactive())
    }
}
