//! cli::commands::status
//!
//! Print the repository state the workflows decide on.

use super::{fatal, load_config, open_repository};
use crate::engine::Context;
use crate::git::{GitCli, InspectError, Inspector, RepoState, SystemRunner};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Run the status command.
pub fn status(ctx: &Context) -> Result<u8> {
    let runner = SystemRunner;
    let git = GitCli::new(&runner, ctx.cwd.as_deref());

    let root = match open_repository(git)? {
        Ok(root) => root,
        Err(code) => return Ok(code),
    };
    let config = load_config(Some(&root))?;

    let state = match Inspector::new(git, config.remote()).capture() {
        Ok(state) => state,
        Err(InspectError::Launch(err)) => return Ok(fatal(err)),
        Err(err) => return Err(err).context("Failed to read repository state"),
    };

    output::print(render(&state, config.remote()), ctx.verbosity());
    Ok(0)
}

/// Status table, one fact per line.
fn render(state: &RepoState, remote: &str) -> String {
    let mut lines = vec![
        format!("Branch:              {}", state.current_branch),
        format!(
            "Uncommitted changes: {}",
            output::yes_no(state.has_uncommitted_changes)
        ),
        format!(
            "Staged changes:      {}",
            output::yes_no(state.has_staged_changes)
        ),
    ];

    match &state.ahead_behind {
        Some(counts) => lines.push(format!(
            "Upstream:            {}/{} ({})",
            remote, state.current_branch, counts
        )),
        None => lines.push(format!(
            "Upstream:            none ({}/{} does not exist)",
            remote, state.current_branch
        )),
    }

    lines.push(format!(
        "Rebase in progress:  {}",
        output::yes_no(state.rebase_in_progress)
    ));

    if state.conflicted_files.is_empty() {
        lines.push("Conflicted files:    none".to_string());
    } else {
        let files: Vec<&String> = state.conflicted_files.iter().collect();
        lines.push("Conflicted files:".to_string());
        lines.push(output::format_list(&files, "  "));
    }

    lines.push(format!("Branches:            {}", state.branches.len()));
    lines.join("\n")
}
