//! cli::commands::git
//!
//! Run one guided Git workflow.
//!
//! # Example
//!
//! ```bash
//! # Choose from the menu
//! care git
//!
//! # Push, rebasing first when the remote moved
//! care git push --auto-resolve
//! ```

use super::{interactive, load_config, open_repository, report_outcome, workflow_settings};
use crate::cli::args::GitAction;
use crate::engine::{Context, Operation, Workflow};
use crate::git::{GitCli, SystemRunner};
use crate::ui::TerminalPrompter;
use anyhow::Result;
use tracing::debug;

impl From<GitAction> for Operation {
    fn from(action: GitAction) -> Self {
        match action {
            GitAction::Commit => Operation::Commit,
            GitAction::CommitAndPush => Operation::CommitAndPush,
            GitAction::Push => Operation::Push,
            GitAction::Pull => Operation::Pull,
            GitAction::Merge {
                source,
                destination,
            } => Operation::Merge {
                source,
                destination,
            },
            GitAction::Stash => Operation::Stash,
        }
    }
}

/// Run the git command.
pub fn git(ctx: &Context, action: Option<GitAction>, auto_resolve: bool) -> Result<u8> {
    let runner = SystemRunner;
    let git = GitCli::new(&runner, ctx.cwd.as_deref());

    let root = match open_repository(git)? {
        Ok(root) => root,
        Err(code) => return Ok(code),
    };
    let config = load_config(Some(&root))?;
    let interactive = interactive(ctx, &config);
    let settings = workflow_settings(&config, auto_resolve, interactive);
    debug!(?settings, root = %root.display(), "workflow settings");

    // Stage-all and the marker scan act on the whole tree, not the subdirectory.
    let git = GitCli::new(&runner, Some(&root));
    let prompter = TerminalPrompter::stdio(interactive);
    let mut workflow = Workflow::new(git, &prompter, &settings).with_verbosity(ctx.verbosity());

    match workflow.run(action.map(Operation::from)) {
        Ok(outcome) => Ok(report_outcome(&outcome, ctx.verbosity())),
        Err(err) if err.is_fatal() => Ok(super::fatal(err)),
        Err(err) => Err(err.into()),
    }
}
