//! engine::workflow
//!
//! The commit, push, pull, merge, and stash flows.
//!
//! # Design
//!
//! [`Workflow`] owns nothing but references: a [`GitCli`] for commands, a
//! [`Prompter`] for the operator, and the resolved [`WorkflowSettings`].
//! Each flow is a straight sequence of "ask the repository, decide, run
//! one command" steps. The states passed through are recorded in
//! [`Workflow::history`].
//!
//! The recovery paths live in [`super::recovery`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::operation::{CommitMessage, CommitType, Operation};
use super::outcome::{Outcome, WorkflowState};
use super::recovery::AfterRebase;
use super::report::{self, Report};
use super::{WorkflowError, WorkflowSettings};
use crate::git::{parse, CommandResult, GitCli, InspectError, Inspector};
use crate::ui::output::{self, format_list, Verbosity};
use crate::ui::prompts::{any_text, choose_one, non_empty, Choice, PromptError, Prompter};

/// One workflow run against one repository.
pub struct Workflow<'a> {
    pub(super) git: GitCli<'a>,
    pub(super) prompter: &'a dyn Prompter,
    pub(super) settings: &'a WorkflowSettings,
    verbosity: Verbosity,
    history: Vec<WorkflowState>,
    notes: Vec<String>,
}

impl<'a> Workflow<'a> {
    /// Create a workflow.
    pub fn new(
        git: GitCli<'a>,
        prompter: &'a dyn Prompter,
        settings: &'a WorkflowSettings,
    ) -> Self {
        Self {
            git,
            prompter,
            settings,
            verbosity: Verbosity::Normal,
            history: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Set how much is printed while running.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// States entered, in order.
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// Status lines shown to the operator, in order.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Run `operation`, asking for one when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when git cannot be launched, when a state
    /// query fails, or when a required answer cannot be collected. A
    /// cancelled prompt ends the run as [`Outcome::Aborted`] instead.
    pub fn run(&mut self, operation: Option<Operation>) -> Result<Outcome, WorkflowError> {
        self.history.clear();
        self.enter(WorkflowState::Idle);

        match self.dispatch(operation) {
            Ok(outcome) => Ok(self.finish(outcome)),
            Err(WorkflowError::Prompt(PromptError::Cancelled)) => {
                Ok(self.finish(Outcome::aborted("prompt cancelled")))
            }
            Err(err) => {
                self.enter(WorkflowState::Failed);
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, operation: Option<Operation>) -> Result<Outcome, WorkflowError> {
        let operation = match operation {
            Some(operation) => operation,
            None => self.choose_operation()?,
        };
        self.enter(WorkflowState::OperationChosen);
        info!(%operation, "operation chosen");

        match operation {
            Operation::Commit => self.commit(),
            Operation::CommitAndPush => self.commit_and_push(),
            Operation::Push => self.push(),
            Operation::Pull => self.pull(),
            Operation::Merge {
                source,
                destination,
            } => self.merge(source, destination),
            Operation::Stash => self.stash(true),
        }
    }

    fn choose_operation(&self) -> Result<Operation, WorkflowError> {
        let options = Operation::menu()
            .into_iter()
            .map(|op| Choice::new(op.label(), op))
            .collect();
        Ok(choose_one(self.prompter, "What do you want to do?", options)?)
    }

    // ---- commit ----

    fn commit(&mut self) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Committing);

        if !self.inspector().has_uncommitted_changes()? {
            return Ok(Outcome::no_op("no changes to commit"));
        }

        let (_, add) = self.execute(&["add", "."])?;
        if !add.is_success() {
            return Ok(Outcome::failed(add.failure_text()));
        }

        let message = self.ask_commit_message()?;
        let line = message.to_string();
        let (_, commit) = self.execute(&["commit", "-m", &line])?;
        if commit.is_success() {
            Ok(Outcome::succeeded(format!("Committed \"{}\"", line)))
        } else {
            Ok(Outcome::failed(commit.failure_text()))
        }
    }

    fn ask_commit_message(&self) -> Result<CommitMessage, WorkflowError> {
        let options = CommitType::ALL
            .iter()
            .map(|kind| Choice::new(kind.label(), *kind))
            .collect();
        let kind = choose_one(self.prompter, "Commit type", options)?;
        loop {
            let body = self.prompter.ask_text("Commit message", &non_empty)?;
            if let Some(message) = CommitMessage::new(kind, &body) {
                return Ok(message);
            }
        }
    }

    fn commit_and_push(&mut self) -> Result<Outcome, WorkflowError> {
        let committed = self.commit()?;
        if !committed.is_succeeded() {
            debug!(outcome = %committed, "commit did not produce a commit; not pushing");
            return Ok(committed);
        }
        self.say(committed.to_string());
        self.push()
    }

    // ---- push ----

    fn push(&mut self) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Pushing);
        let inspector = self.inspector();

        if inspector.has_uncommitted_changes()? {
            return Ok(Outcome::aborted(
                "uncommitted changes present; commit or stash them before pushing",
            ));
        }
        if inspector.has_staged_changes()? {
            return Ok(Outcome::aborted(
                "staged changes have not been committed; commit them before pushing",
            ));
        }
        if !inspector.is_up_to_date()? {
            if let Some(outcome) = self.synchronize()? {
                return Ok(outcome);
            }
        }
        self.push_branch()
    }

    /// Bring the branch level with its remote before pushing.
    ///
    /// Returns `Some` when the push must not go ahead.
    fn synchronize(&mut self) -> Result<Option<Outcome>, WorkflowError> {
        let inspector = self.inspector();
        let settings = self.settings;
        let branch = self.current_branch()?;

        if !inspector.remote_branch_exists(&branch)? {
            debug!(%branch, "no remote branch yet; nothing to sync");
            return Ok(None);
        }
        let counts = inspector.ahead_behind(&branch)?;
        debug!(%branch, %counts, "sync check");
        if counts.behind == 0 {
            return Ok(None);
        }

        self.say(format!(
            "{} is {} commit(s) behind {}/{}; pulling first",
            branch, counts.behind, settings.remote, branch
        ));
        let args: &[&str] = if settings.auto_resolve.unwrap_or(false) {
            &["pull", "--rebase"]
        } else {
            &["pull"]
        };
        let (_, pull) = self.execute(args)?;

        if !pull.is_success() {
            if inspector.rebase_in_progress()? {
                let (_, abort) = self.execute(&["rebase", "--abort"])?;
                if !abort.is_success() {
                    return Ok(Some(Outcome::failed(abort.failure_text())));
                }
                return Ok(Some(Outcome::aborted(
                    "rebasing onto the remote hit conflicts; the rebase was aborted and \
                     nothing was pushed. Run `care git pull --auto-resolve` to resolve them",
                )));
            }
            let conflicts = inspector.conflicted_files()?;
            if !conflicts.is_empty() {
                let files: Vec<_> = conflicts.into_iter().collect();
                return Ok(Some(Outcome::aborted(format!(
                    "pull left conflicts in {}; resolve them before pushing",
                    files.join(", ")
                ))));
            }
            return Ok(Some(Outcome::failed(pull.failure_text())));
        }

        let counts = inspector.ahead_behind(&branch)?;
        if counts.behind > 0 || !inspector.conflicted_files()?.is_empty() {
            return Ok(Some(Outcome::aborted(format!(
                "{} is still not in sync with {}/{} after pulling ({})",
                branch, settings.remote, branch, counts
            ))));
        }
        Ok(None)
    }

    fn push_branch(&mut self) -> Result<Outcome, WorkflowError> {
        let settings = self.settings;
        let branch = self.current_branch()?;
        let has_upstream = self.inspector().remote_branch_exists(&branch)?;

        let (result, push) = if has_upstream {
            self.execute(&["push"])?
        } else {
            self.execute(&["push", "--set-upstream", &settings.remote, &branch])?
        };

        if push.is_success() {
            return Ok(Outcome::succeeded(format!(
                "Pushed {} to {}",
                branch, settings.remote
            )));
        }
        if parse::is_non_fast_forward_rejection(&result) {
            return self.recover_rejected_push();
        }
        Ok(Outcome::failed(push.failure_text()))
    }

    // ---- pull ----

    fn pull(&mut self) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Pulling);
        let inspector = self.inspector();

        let auto_resolve = match self.settings.auto_resolve {
            Some(auto) => auto,
            None => self.prompter.confirm(
                "Resolve conflicts automatically (rebase, then merge tool)?",
                false,
            )?,
        };

        if inspector.has_uncommitted_changes()? {
            let stash_first = match self
                .prompter
                .confirm("Local changes could be lost by pulling. Stash them first?", false)
            {
                Ok(answer) => answer,
                Err(PromptError::NotInteractive(_)) => false,
                Err(err) => return Err(err.into()),
            };
            if !stash_first {
                return Ok(Outcome::aborted(
                    "local changes present; commit them or run `care git stash` before pulling",
                ));
            }
            let stashed = self.stash(false)?;
            if !stashed.is_succeeded() {
                return Ok(stashed);
            }
            self.say(stashed.to_string());
            self.enter(WorkflowState::Pulling);
        }

        let args: &[&str] = if auto_resolve {
            &["pull", "--rebase"]
        } else {
            &["pull"]
        };
        let (result, pull) = self.execute(args)?;
        if pull.is_success() {
            if parse::reports_up_to_date(&result.stdout) {
                return Ok(Outcome::no_op("already up to date"));
            }
            return Ok(Outcome::succeeded(format!(
                "Pulled from {}",
                self.settings.remote
            )));
        }

        let conflicted =
            parse::reports_conflict(&result) || !inspector.listed_conflicts()?.is_empty();
        if !conflicted {
            return Ok(Outcome::failed(pull.failure_text()));
        }

        self.enter(WorkflowState::Recovering);
        if auto_resolve && inspector.rebase_in_progress()? {
            self.run_merge_tool()?;
            return self.conflict_loop(AfterRebase::Finish);
        }

        let files: Vec<_> = inspector.conflicted_files()?.into_iter().collect();
        Ok(Outcome::failed(format!(
            "pull stopped on conflicts in {}. Resolve them by hand, stage the files, and \
             commit (or run `git rebase --continue` if a rebase is in progress)",
            if files.is_empty() {
                "the working tree".to_string()
            } else {
                files.join(", ")
            }
        )))
    }

    // ---- merge ----

    fn merge(
        &mut self,
        source: Option<String>,
        destination: Option<String>,
    ) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Merging);
        let inspector = self.inspector();

        let branches = inspector.branches()?;
        if branches.len() < 2 {
            return Ok(Outcome::aborted(format!(
                "merging needs at least two branches; this repository has {}",
                branches.len()
            )));
        }

        let source = match source {
            Some(source) if branches.contains(&source) => source,
            Some(source) => {
                return Ok(Outcome::aborted(format!(
                    "branch '{}' does not exist",
                    source
                )))
            }
            None => self.choose_branch("Merge from which branch?", &branches)?,
        };

        let choices = parse::destination_choices(&branches, &source);
        if choices.is_empty() {
            return Ok(Outcome::aborted(format!(
                "no branch other than '{}' to merge into",
                source
            )));
        }
        let destination = match destination {
            Some(destination) if choices.contains(&destination) => destination,
            Some(destination) => {
                return Ok(Outcome::aborted(format!(
                    "'{}' is not a valid destination for '{}'",
                    destination, source
                )))
            }
            None => self.choose_branch(
                &format!("Merge {} into which branch?", source),
                &choices,
            )?,
        };

        let target = self.local_branch_name(&destination).to_string();
        let (_, checkout) = self.execute(&["checkout", &target])?;
        if !checkout.is_success() {
            return Ok(Outcome::failed(format!(
                "could not check out '{}', so the merge was not attempted: {}",
                target,
                checkout.failure_text()
            )));
        }

        let (result, merge) = self.execute(&["merge", &source])?;
        if merge.is_success() {
            return Ok(Outcome::succeeded(format!(
                "Merged {} into {}",
                source, target
            )));
        }
        if parse::reports_conflict(&result) {
            let files: Vec<_> = inspector.conflicted_files()?.into_iter().collect();
            return Ok(Outcome::failed(format!(
                "merging {} into {} stopped on conflicts in {}; resolve and commit, or run \
                 `git merge --abort`",
                source,
                target,
                files.join(", ")
            )));
        }
        Ok(Outcome::failed(merge.failure_text()))
    }

    fn choose_branch(&self, prompt: &str, branches: &[String]) -> Result<String, WorkflowError> {
        let options = branches
            .iter()
            .map(|b| Choice::new(b.clone(), b.clone()))
            .collect();
        Ok(choose_one(self.prompter, prompt, options)?)
    }

    /// `remotes/origin/dev` is checked out as `dev`.
    fn local_branch_name<'b>(&self, branch: &'b str) -> &'b str {
        let prefix = format!("remotes/{}/", self.settings.remote);
        branch.strip_prefix(prefix.as_str()).unwrap_or(branch)
    }

    // ---- stash ----

    pub(super) fn stash(&mut self, ask_label: bool) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Stashing);

        if !self.inspector().has_uncommitted_changes()? {
            return Ok(Outcome::no_op("no local changes to stash"));
        }

        let typed = if ask_label {
            match self
                .prompter
                .ask_text("Stash label (empty for a timestamp)", &any_text)
            {
                Ok(label) => label,
                Err(PromptError::NotInteractive(_)) => String::new(),
                Err(err) => return Err(err.into()),
            }
        } else {
            String::new()
        };
        let label = if typed.trim().is_empty() {
            default_stash_label(Utc::now())
        } else {
            typed.trim().to_string()
        };

        let (_, stash) = self.execute(&["stash", "push", "-m", &label])?;
        if stash.is_success() {
            Ok(Outcome::succeeded(format!("Stashed local changes as \"{}\"", label)))
        } else {
            Ok(Outcome::failed(stash.failure_text()))
        }
    }

    // ---- shared helpers ----

    pub(super) fn inspector(&self) -> Inspector<'a> {
        let settings: &'a WorkflowSettings = self.settings;
        Inspector::new(self.git, &settings.remote)
    }

    /// Current branch, falling back to the configured default when HEAD
    /// is detached.
    pub(super) fn current_branch(&self) -> Result<String, WorkflowError> {
        match self.inspector().current_branch() {
            Ok(branch) => Ok(branch),
            Err(err @ InspectError::StateAmbiguous { .. }) => match &self.settings.default_branch {
                Some(branch) => {
                    warn!(%err, %branch, "using configured default branch");
                    Ok(branch.clone())
                }
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }

    pub(super) fn execute(&mut self, args: &[&str]) -> Result<(CommandResult, Report), WorkflowError> {
        self.execute_with_env(args, &[])
    }

    /// Run a write command and classify it. A launch failure ends the run.
    pub(super) fn execute_with_env(
        &mut self,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<(CommandResult, Report), WorkflowError> {
        let command = format!("git {}", args.join(" "));
        let result = self.git.run_with_env(args, env);
        let report = report::classify(&command, &result);
        self.say(report.render());
        match result {
            Ok(result) => Ok((result, report)),
            Err(err) => Err(WorkflowError::Launch(err)),
        }
    }

    pub(super) fn enter(&mut self, state: WorkflowState) {
        debug!(?state, "workflow state");
        self.history.push(state);
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        info!(state = ?outcome.state(), %outcome, "workflow finished");
        self.enter(outcome.state());
        outcome
    }

    pub(super) fn say(&mut self, line: impl Into<String>) {
        let line = line.into();
        output::print(&line, self.verbosity);
        self.notes.push(line);
    }

    pub(super) fn say_list(&mut self, heading: &str, items: &[String]) {
        self.say(format!("{}\n{}", heading, format_list(items, "  ")));
    }
}

/// Label used when the operator does not name a stash.
pub fn default_stash_label(now: DateTime<Utc>) -> String {
    format!("care: {}", now.format("%Y-%m-%d %H:%M:%S UTC"))
}
