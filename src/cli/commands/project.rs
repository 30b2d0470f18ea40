//! cli::commands::project
//!
//! Create a project from a configured template.

use super::{interactive, load_config, report_outcome, working_dir};
use crate::engine::{Context, Outcome};
use crate::git::SystemRunner;
use crate::scaffold::{ProjectRequest, ScaffoldError, Scaffolder};
use crate::ui::{PromptError, TerminalPrompter};
use anyhow::{Context as _, Result};

/// Run the project command.
pub fn project(
    ctx: &Context,
    template: Option<String>,
    name: Option<String>,
    skip_install: bool,
) -> Result<u8> {
    let base = working_dir(ctx)?;
    let config = load_config(None)?;
    let prompter = TerminalPrompter::stdio(interactive(ctx, &config));
    let runner = SystemRunner;

    let request = ProjectRequest {
        template,
        name,
        skip_install,
    };

    match Scaffolder::new(&runner, &prompter, base).create(config.templates(), &request) {
        Ok(outcome) => Ok(report_outcome(&outcome, ctx.verbosity())),
        Err(ScaffoldError::Prompt(PromptError::Cancelled)) => {
            let outcome = Outcome::aborted("prompt cancelled");
            Ok(report_outcome(&outcome, ctx.verbosity()))
        }
        Err(err) => Err(err).context("Failed to create project"),
    }
}
