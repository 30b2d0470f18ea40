//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and resolves it against the global flags
//! 2. Calls the engine, the scaffolder or the board client
//! 3. Prints the outcome and returns the exit code
//!
//! # Async Commands
//!
//! `tasks` talks to the network. It builds a tokio runtime for the one
//! command and blocks on it; everything else is synchronous.

mod completion;
mod config_cmd;
mod git;
mod project;
mod status;
mod tasks;

pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use git::git;
pub use project::project;
pub use status::status;
pub use tasks::{tasks_list, tasks_timer};

use std::path::{Path, PathBuf};

use crate::cli::args::{Command, ConfigAction, TasksAction};
use crate::cli::EXIT_FATAL;
use crate::core::config::Config;
use crate::engine::{Context, Outcome, WorkflowSettings};
use crate::git::{GitCli, InspectError, Inspector};
use crate::ui::{output, Verbosity};
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<u8> {
    match command {
        Command::Git {
            action,
            auto_resolve,
        } => git::git(ctx, action, auto_resolve),
        Command::Status => status::status(ctx),
        Command::Project {
            template,
            name,
            skip_install,
        } => project::project(ctx, template, name, skip_install),
        Command::Tasks { action } => match action {
            TasksAction::List { board } => tasks::tasks_list(ctx, board.as_deref()),
            TasksAction::Timer { task_id, board } => {
                tasks::tasks_timer(ctx, &task_id, board.as_deref())
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, value.as_deref()),
            ConfigAction::List => config_cmd::list(ctx),
        }
        .map(|()| 0),
        Command::Completion { shell } => completion::completion(shell).map(|()| 0),
    }
}

/// Directory the command acts on.
pub(crate) fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}

/// Load global config plus the repo file under `repo_root`, if given.
pub(crate) fn load_config(repo_root: Option<&Path>) -> Result<Config> {
    let loaded = Config::load(repo_root).context("Failed to load configuration")?;
    Ok(loaded.config)
}

/// Whether prompts are allowed after applying the config default.
pub(crate) fn interactive(ctx: &Context, config: &Config) -> bool {
    ctx.interactive && config.interactive()
}

/// Editor for conflicted files, from `$VISUAL` then `$EDITOR`.
pub(crate) fn editor_from_env() -> Option<String> {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

/// Resolve workflow settings from config and flags.
///
/// `--auto-resolve` forces auto mode. Without it a non-interactive run
/// takes the manual path instead of asking.
pub(crate) fn workflow_settings(
    config: &Config,
    auto_resolve: bool,
    interactive: bool,
) -> WorkflowSettings {
    WorkflowSettings {
        remote: config.remote().to_string(),
        default_branch: config.default_branch().map(String::from),
        merge_tool: config.merge_tool().map(String::from),
        editor: editor_from_env(),
        auto_resolve: if auto_resolve {
            Some(true)
        } else if !interactive {
            Some(false)
        } else {
            None
        },
    }
}

/// Report a program that could not be launched.
pub(crate) fn fatal(err: impl std::fmt::Display) -> u8 {
    output::error(err);
    EXIT_FATAL
}

/// Locate the repository root, or the exit code to stop with.
pub(crate) fn open_repository(git: GitCli<'_>) -> Result<std::result::Result<PathBuf, u8>> {
    match Inspector::new(git, "").repo_root() {
        Ok(root) => Ok(Ok(root)),
        Err(InspectError::Launch(err)) => Ok(Err(fatal(err))),
        Err(err) => Err(err).context("Not inside a git repository"),
    }
}

/// Print an outcome and map it to an exit code.
pub(crate) fn report_outcome(outcome: &Outcome, verbosity: Verbosity) -> u8 {
    match outcome {
        Outcome::Failed { .. } => eprintln!("{}", outcome),
        _ => output::print(outcome, verbosity),
    }
    outcome.exit_code() as u8
}
