//! engine::recovery
//!
//! Rejected-push recovery and the interactive conflict loop.
//!
//! # Flow
//!
//! ```text
//! push rejected (non-fast-forward)
//!   -> pull --rebase
//!        clean     -> push (once)
//!        conflicts -> loop { continue | open in editor | skip | abort }
//!                       continue -> markers gone? -> add . -> all staged?
//!                                -> rebase --continue -> marker scan
//!                                -> push --force-with-lease
//!                       skip     -> rebase --skip (only once a commit
//!                                   came out empty)
//!                       abort    -> rebase --abort
//! ```
//!
//! The force push only happens after a whole-tree scan finds no conflict
//! markers in tracked files, and it is always lease-guarded so it fails if
//! the remote moved since the fetch.

use tracing::{debug, warn};

use super::outcome::{Outcome, WorkflowState};
use super::workflow::Workflow;
use super::WorkflowError;
use crate::git::{parse, RunOptions};
use crate::ui::prompts::{choose_one, Choice, PromptError};

/// What happens once a conflicted rebase finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRebase {
    /// The rebase came from a rejected push: push again with a lease.
    ForcePush,
    /// The rebase came from a pull: nothing more to do.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictAction {
    Continue,
    OpenEditor,
    Skip,
    Abort,
}

/// Where one continue or skip attempt leaves the loop.
enum Step {
    Done(Outcome),
    Offer,
    EmptyCommit,
}

const CONFLICT_PROMPT: &str = "Rebase stopped on conflicts. Resolve them, then choose:";

impl Workflow<'_> {
    /// Recover from a push the remote refused as non-fast-forward.
    pub(super) fn recover_rejected_push(&mut self) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Recovering);
        self.say("Push rejected: the remote has commits this branch does not. Rebasing onto them.");

        let (result, pull) = self.execute(&["pull", "--rebase"])?;
        if parse::reports_conflict(&result)
            || (!pull.is_success() && self.inspector().rebase_in_progress()?)
        {
            return self.conflict_loop(AfterRebase::ForcePush);
        }
        if !pull.is_success() {
            return Ok(Outcome::failed(pull.failure_text()));
        }

        let (_, retry) = self.execute(&["push"])?;
        if retry.is_success() {
            Ok(Outcome::succeeded("Pushed after rebasing onto the remote"))
        } else {
            Ok(Outcome::failed(format!(
                "push failed again after rebasing: {}",
                retry.failure_text()
            )))
        }
    }

    /// Offer continue/abort until the rebase is finished or abandoned.
    pub(super) fn conflict_loop(&mut self, after: AfterRebase) -> Result<Outcome, WorkflowError> {
        self.enter(WorkflowState::Recovering);

        let mut empty_commit = false;
        loop {
            let unresolved: Vec<String> =
                self.inspector().conflicted_files()?.into_iter().collect();
            if !unresolved.is_empty() {
                self.say_list("Unresolved conflicts:", &unresolved);
            }

            let mut options = vec![
                Choice::new("Continue (conflicts are resolved)", ConflictAction::Continue),
                Choice::new("Abort the rebase", ConflictAction::Abort),
            ];
            if empty_commit {
                options.insert(
                    1,
                    Choice::new("Skip this now-empty commit", ConflictAction::Skip),
                );
            }
            if self.settings.editor.is_some() && !unresolved.is_empty() {
                options.insert(
                    1,
                    Choice::new("Open conflicted files in editor", ConflictAction::OpenEditor),
                );
            }

            let action = match choose_one(self.prompter, CONFLICT_PROMPT, options) {
                Ok(action) => action,
                Err(PromptError::Cancelled) => {
                    return Ok(Outcome::aborted(
                        "prompt cancelled; the rebase is still in progress \
                         (finish with `git rebase --continue` or `git rebase --abort`)",
                    ))
                }
                Err(err) => return Err(err.into()),
            };
            debug!(?action, "conflict loop");

            let step = match action {
                ConflictAction::Abort => return self.abort_rebase(),
                ConflictAction::OpenEditor => {
                    self.open_editor(&unresolved)?;
                    continue;
                }
                ConflictAction::Continue => self.continue_rebase(after)?,
                ConflictAction::Skip => self.skip_commit(after)?,
            };
            match step {
                Step::Done(outcome) => return Ok(outcome),
                Step::Offer => empty_commit = false,
                Step::EmptyCommit => empty_commit = true,
            }
        }
    }

    /// One "continue" attempt.
    fn continue_rebase(&mut self, after: AfterRebase) -> Result<Step, WorkflowError> {
        let inspector = self.inspector();

        let remaining: Vec<String> = inspector.conflicted_files()?.into_iter().collect();
        if !remaining.is_empty() {
            self.say_list("Conflict markers remain in:", &remaining);
            return Ok(Step::Offer);
        }

        let (_, add) = self.execute(&["add", "."])?;
        if !add.is_success() {
            return Ok(Step::Done(Outcome::failed(add.failure_text())));
        }

        let unstaged = inspector.unstaged_entries()?;
        if !unstaged.is_empty() {
            self.say_list("error: these paths are still not staged:", &unstaged);
            return Ok(Step::Offer);
        }

        let (result, cont) =
            self.execute_with_env(&["rebase", "--continue"], &[("GIT_EDITOR", "true")])?;
        if !cont.is_success() {
            let in_progress = inspector.rebase_in_progress()?;
            if in_progress && parse::reports_empty_commit(&result) {
                self.say(
                    "Resolving left this commit with no changes. Skip it to drop the commit \
                     and carry on with the rebase.",
                );
                return Ok(Step::EmptyCommit);
            }
            if parse::reports_conflict(&result) {
                self.say("The next commit in the rebase conflicts as well.");
                return Ok(Step::Offer);
            }
            if in_progress {
                self.say(format!(
                    "rebase --continue did not finish: {}",
                    cont.failure_text()
                ));
                return Ok(Step::Offer);
            }
            return Ok(Step::Done(Outcome::failed(cont.failure_text())));
        }
        if inspector.rebase_in_progress()? {
            return Ok(Step::Offer);
        }

        self.finish_rebase(after).map(Step::Done)
    }

    /// Drop the current commit from the rebase.
    fn skip_commit(&mut self, after: AfterRebase) -> Result<Step, WorkflowError> {
        let inspector = self.inspector();

        let (result, skip) =
            self.execute_with_env(&["rebase", "--skip"], &[("GIT_EDITOR", "true")])?;
        if !skip.is_success() {
            if parse::reports_conflict(&result) {
                self.say("The next commit in the rebase conflicts as well.");
                return Ok(Step::Offer);
            }
            if !inspector.rebase_in_progress()? {
                return Ok(Step::Done(Outcome::failed(skip.failure_text())));
            }
            return Ok(Step::Offer);
        }
        if inspector.rebase_in_progress()? {
            return Ok(Step::Offer);
        }

        self.finish_rebase(after).map(Step::Done)
    }

    fn finish_rebase(&mut self, after: AfterRebase) -> Result<Outcome, WorkflowError> {
        match after {
            AfterRebase::Finish => Ok(Outcome::succeeded("Rebase completed; conflicts resolved")),
            AfterRebase::ForcePush => {
                let marked = self.inspector().files_with_conflict_markers()?;
                if !marked.is_empty() {
                    return Ok(Outcome::aborted(format!(
                        "conflict markers remain in {}; the force push was withheld",
                        marked.join(", ")
                    )));
                }
                let (_, push) = self.execute(&["push", "--force-with-lease"])?;
                if push.is_success() {
                    Ok(Outcome::succeeded("Pushed after resolving conflicts"))
                } else {
                    Ok(Outcome::failed(push.failure_text()))
                }
            }
        }
    }

    fn abort_rebase(&mut self) -> Result<Outcome, WorkflowError> {
        let (_, abort) = self.execute(&["rebase", "--abort"])?;
        if abort.is_success() {
            Ok(Outcome::aborted(
                "rebase aborted; the branch is back where it was before the pull",
            ))
        } else {
            Ok(Outcome::failed(abort.failure_text()))
        }
    }

    /// Run the configured merge tool once over the conflicted files.
    pub(super) fn run_merge_tool(&mut self) -> Result<(), WorkflowError> {
        let settings = self.settings;
        let Some(tool) = settings.merge_tool.as_deref() else {
            self.say("No merge tool configured (set `merge_tool`); resolve the files by hand.");
            return Ok(());
        };
        let result = self.git.run_interactive(&["mergetool", "--tool", tool])?;
        if !result.success() {
            warn!(tool, exit_code = result.exit_code, "merge tool did not finish cleanly");
            self.say(format!(
                "merge tool '{}' exited with status {}",
                tool, result.exit_code
            ));
        }
        Ok(())
    }

    /// Open `files` in `$VISUAL`/`$EDITOR`. Editor problems are reported,
    /// not fatal.
    fn open_editor(&mut self, files: &[String]) -> Result<(), WorkflowError> {
        let settings = self.settings;
        let Some(editor) = settings.editor.as_deref() else {
            return Ok(());
        };
        let mut parts = editor.split_whitespace();
        let Some(program) = parts.next() else {
            return Ok(());
        };
        let mut args: Vec<&str> = parts.collect();
        args.extend(files.iter().map(String::as_str));

        let root = self.inspector().repo_root()?;
        let options = RunOptions::in_dir(Some(&root)).interactive();
        match self.git.runner().run(program, &args, &options) {
            Ok(result) if !result.success() => self.say(format!(
                "editor '{}' exited with status {}",
                program, result.exit_code
            )),
            Ok(_) => {}
            Err(err) => self.say(format!("could not open editor: {}", err)),
        }
        Ok(())
    }
}
