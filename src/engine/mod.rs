//! engine
//!
//! The Git workflow state machine.
//!
//! # Architecture
//!
//! A workflow run picks one [`Operation`], then alternates between asking
//! the [`git::Inspector`](crate::git::Inspector) about the repository and
//! issuing write commands through the runner. Every write command's result
//! is classified by [`report`] before the next decision is made.
//!
//! ```text
//! Idle -> OperationChosen -> {Committing, Pushing, Pulling, Merging, Stashing}
//!      -> {Succeeded, Recovering, Aborted, Failed}
//! ```
//!
//! # Invariants
//!
//! - Repository state is queried again before every decision; nothing is
//!   cached between steps
//! - Only the enumerated recovery paths (rejected push, conflicted pull)
//!   treat a failed command as recoverable
//! - A force push is always lease-guarded and preceded by a whole-tree
//!   conflict marker check
//! - Declining at a gate is [`Outcome::Aborted`], never an error

pub mod operation;
pub mod outcome;
pub mod recovery;
pub mod report;
pub mod workflow;

pub use operation::{CommitMessage, CommitType, Operation};
pub use outcome::{Outcome, WorkflowState};
pub use report::{classify, Classification, Report};
pub use workflow::Workflow;

use std::path::PathBuf;

use thiserror::Error;

use crate::git::{InspectError, RunnerError};
use crate::ui::{PromptError, Verbosity};

/// Execution context shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override
    pub cwd: Option<PathBuf>,
    /// Debug output enabled
    pub debug: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Prompts allowed
    pub interactive: bool,
}

impl Context {
    /// Output verbosity for these flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Knobs a workflow run reads; resolved from config and flags by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Remote to sync against
    pub remote: String,
    /// Branch to fall back on when HEAD is detached
    pub default_branch: Option<String>,
    /// Tool for `git mergetool --tool`, if the operator configured one
    pub merge_tool: Option<String>,
    /// Editor command for conflicted files
    pub editor: Option<String>,
    /// Rebase and resolve automatically; `None` means ask when it matters
    pub auto_resolve: Option<bool>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            default_branch: None,
            merge_tool: None,
            editor: None,
            auto_resolve: None,
        }
    }
}

/// Failures that stop a workflow outright.
///
/// A command reporting failure is not one of these; it becomes an
/// [`Outcome`]. These are the cases where the engine cannot tell what the
/// repository looks like or cannot talk to the operator.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// git (or another tool) could not be launched.
    #[error(transparent)]
    Launch(#[from] RunnerError),

    /// A repository query failed or returned output it could not read.
    #[error(transparent)]
    Inspect(#[from] InspectError),

    /// The operator could not be asked.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl WorkflowError {
    /// Whether a required program could not be started.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkflowError::Launch(_) | WorkflowError::Inspect(InspectError::Launch(_))
        )
    }
}
