//! End-to-end workflow scenarios.
//!
//! Each test scripts the git output a real repository would produce and
//! the answers an operator would give, runs one workflow, and checks the
//! commands that were issued.

use std::fs;

use tempfile::TempDir;

use carework::engine::{
    CommitType, Operation, Outcome, Workflow, WorkflowSettings, WorkflowState,
};
use carework::git::mock::{self, ScriptedRunner};
use carework::git::{GitCli, RunnerError};
use carework::ui::{ScriptedPrompter, Verbosity};

const OID_A: &str = "1111111111111111111111111111111111111111";
const OID_B: &str = "2222222222222222222222222222222222222222";

const CONFLICT_PROMPT: &str = "Rebase stopped on conflicts";
const CONTINUE: &str = "Continue (conflicts are resolved)";
const ABORT: &str = "Abort the rebase";

const REJECTED: &str = "To github.com:acme/app.git\n ! [rejected]        main -> main (non-fast-forward)\n\
error: failed to push some refs to 'github.com:acme/app.git'\n";

struct Run {
    outcome: Outcome,
    history: Vec<WorkflowState>,
}

fn run(
    runner: &ScriptedRunner,
    prompter: &ScriptedPrompter,
    settings: &WorkflowSettings,
    operation: Option<Operation>,
) -> Run {
    let mut workflow =
        Workflow::new(GitCli::new(runner, None), prompter, settings).with_verbosity(Verbosity::Quiet);
    let outcome = workflow.run(operation).expect("workflow error");
    Run {
        outcome,
        history: workflow.history().to_vec(),
    }
}

/// A clean `main` that matches its remote and has an upstream.
fn clean_in_sync_repo() -> ScriptedRunner {
    repo(&[""], OID_A)
}

/// `main` with an upstream whose remote HEAD is `remote_head`;
/// `status --porcelain` answers in order.
fn repo(porcelain: &[&str], remote_head: &str) -> ScriptedRunner {
    let runner = ScriptedRunner::new();
    for status in porcelain {
        runner.on(&["status", "--porcelain"], mock::ok(status));
    }
    runner.on(&["diff", "--cached", "--quiet"], mock::ok(""));
    runner.on(&["fetch"], mock::ok(""));
    runner.on(&["rev-parse", "HEAD"], mock::ok(&format!("{}\n", OID_A)));
    runner.on(&["ls-remote"], mock::ok(&format!("{}\tHEAD\n", remote_head)));
    runner.on(&["rev-parse", "--abbrev-ref", "HEAD"], mock::ok("main\n"));
    runner.on(&["rev-parse", "--verify"], mock::ok(&format!("{}\n", OID_A)));
    runner
}

// =============================================================================
// Push
// =============================================================================

mod push {
    use super::*;

    #[test]
    fn clean_in_sync_push_is_one_push() {
        let runner = clean_in_sync_repo();
        runner.on(&["push"], mock::ok(""));
        let prompter = ScriptedPrompter::new().choose("Push");

        let result = run(&runner, &prompter, &WorkflowSettings::default(), None);

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert_eq!(runner.count(&["push"]), 1);
        assert_eq!(runner.count_exact(&["push"]), 1);
        assert_eq!(runner.count(&["pull"]), 0);
        assert_eq!(result.history.first(), Some(&WorkflowState::Idle));
        assert!(result.history.contains(&WorkflowState::Pushing));
        assert_eq!(result.history.last(), Some(&WorkflowState::Succeeded));
    }

    #[test]
    fn dirty_tree_aborts_before_any_remote_command() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(" M src/main.rs\n"));
        let prompter = ScriptedPrompter::new();

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        match &result.outcome {
            Outcome::Aborted { reason } => assert!(reason.contains("uncommitted changes")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(runner.count(&["push"]), 0);
        assert_eq!(runner.count(&["pull"]), 0);
        assert_eq!(runner.count(&["fetch"]), 0);
        assert_eq!(result.outcome.exit_code(), 0);
    }

    #[test]
    fn staged_changes_abort_the_push() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(""));
        runner.on(&["diff", "--cached", "--quiet"], mock::fail(1, ""));
        let prompter = ScriptedPrompter::new();

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
        assert_eq!(runner.count(&["push"]), 0);
    }

    #[test]
    fn behind_remote_pulls_before_pushing() {
        let runner = repo(&[""], OID_B);
        // First count before the pull, second after.
        runner.on(&["rev-list"], mock::ok("1\t2\n"));
        runner.on(&["rev-list"], mock::ok("1\t0\n"));
        runner.on(&["diff", "--name-only"], mock::ok(""));
        runner.on(&["pull", "--rebase"], mock::ok("Successfully rebased and updated refs/heads/main.\n"));
        runner.on(&["push"], mock::ok(""));
        let settings = WorkflowSettings {
            auto_resolve: Some(true),
            ..WorkflowSettings::default()
        };

        let result = run(&runner, &ScriptedPrompter::new(), &settings, Some(Operation::Push));

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert!(runner.position(&["pull", "--rebase"]) < runner.position(&["push"]));
        assert_eq!(runner.count_exact(&["push"]), 1);
    }

    #[test]
    fn still_behind_after_pull_aborts() {
        let runner = repo(&[""], OID_B);
        runner.on(&["rev-list"], mock::ok("0\t3\n"));
        runner.on(&["diff", "--name-only"], mock::ok(""));
        runner.on(&["pull"], mock::ok(""));

        let settings = WorkflowSettings {
            auto_resolve: Some(false),
            ..WorkflowSettings::default()
        };
        let result = run(&runner, &ScriptedPrompter::new(), &settings, Some(Operation::Push));

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
        assert_eq!(runner.count(&["push"]), 0);
    }
}

// =============================================================================
// Rejected push recovery
// =============================================================================

mod rejected_push {
    use super::*;

    fn rejected_repo() -> ScriptedRunner {
        let runner = clean_in_sync_repo();
        runner.on(&["push"], mock::fail(1, REJECTED));
        runner
    }

    #[test]
    fn rejection_rebases_before_any_further_push() {
        let runner = rejected_repo();
        runner.on(&["push"], mock::ok(""));
        runner.on(&["pull", "--rebase"], mock::ok("Successfully rebased and updated refs/heads/main.\n"));

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        let lines = runner.command_lines();
        let pushes: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.starts_with("push"))
            .map(|(i, _)| i)
            .collect();
        let rebase = runner.position(&["pull", "--rebase"]).unwrap();
        assert_eq!(pushes.len(), 2);
        assert!(pushes[0] < rebase && rebase < pushes[1]);
        assert_eq!(runner.count(&["push", "--force-with-lease"]), 0);
        assert!(result.history.contains(&WorkflowState::Recovering));
    }

    #[test]
    fn could_not_apply_enters_conflict_loop_without_plain_push() {
        let runner = rejected_repo();
        runner.on(
            &["pull", "--rebase"],
            mock::fail(1, "error: could not apply 1a2b3c4... tweak header\n"),
        );
        runner.on(&["diff", "--name-only"], mock::ok(""));
        runner.on(&["rebase", "--abort"], mock::ok(""));
        let prompter = ScriptedPrompter::new().choose(ABORT);

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
        assert_eq!(runner.count_exact(&["push"]), 1, "only the rejected push");
        assert_eq!(runner.count(&["push", "--force-with-lease"]), 0);
        assert!(prompter.options_for(CONFLICT_PROMPT).is_some());
        assert_eq!(runner.count(&["rebase", "--abort"]), 1);
    }

    #[test]
    fn resolved_rebase_force_pushes_with_lease() {
        let runner = rejected_repo();
        runner.on(&["pull", "--rebase"], mock::fail(1, "CONFLICT (content): Merge conflict in a.rs\n"));
        runner.on(&["diff", "--name-only"], mock::ok(""));
        runner.on(&["add", "."], mock::ok(""));
        runner.on(&["rebase", "--continue"], mock::ok(""));
        runner.on(&["status"], mock::ok("On branch main\nnothing to commit\n"));
        runner.on(&["grep"], mock::fail(1, ""));
        runner.on(&["push", "--force-with-lease"], mock::ok(""));
        let prompter = ScriptedPrompter::new().choose(CONTINUE);

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert_eq!(runner.count(&["push", "--force-with-lease"]), 1);
        assert_eq!(runner.count_exact(&["push"]), 1);
        assert!(runner.position(&["grep"]) < runner.position(&["push", "--force-with-lease"]));

        let cont = runner
            .calls()
            .into_iter()
            .find(|c| c.starts_with(&["rebase", "--continue"]))
            .unwrap();
        assert!(cont
            .env
            .contains(&("GIT_EDITOR".to_string(), "true".to_string())));
    }

    #[test]
    fn markers_left_in_tree_withhold_force_push() {
        let runner = rejected_repo();
        runner.on(&["pull", "--rebase"], mock::fail(1, "CONFLICT (content): Merge conflict in a.rs\n"));
        runner.on(&["diff", "--name-only"], mock::ok(""));
        runner.on(&["add", "."], mock::ok(""));
        runner.on(&["rebase", "--continue"], mock::ok(""));
        runner.on(&["status"], mock::ok("On branch main\n"));
        runner.on(&["grep"], mock::ok("docs/notes.md\n"));
        let prompter = ScriptedPrompter::new().choose(CONTINUE);

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        match &result.outcome {
            Outcome::Aborted { reason } => assert!(reason.contains("docs/notes.md")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(runner.count(&["push", "--force-with-lease"]), 0);
    }

    #[test]
    fn cancelling_the_offer_leaves_rebase_in_place() {
        let runner = rejected_repo();
        runner.on(&["pull", "--rebase"], mock::fail(1, "CONFLICT (content): Merge conflict in a.rs\n"));
        runner.on(&["diff", "--name-only"], mock::ok(""));

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::Push),
        );

        match &result.outcome {
            Outcome::Aborted { reason } => assert!(reason.contains("still in progress")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(runner.count(&["rebase"]), 0);
    }
}

// =============================================================================
// Conflict confirmation
// =============================================================================

mod conflict_confirmation {
    use super::*;

    const MARKED: &str = "fn main() {\n<<<<<<< HEAD\n    ours();\n=======\n    theirs();\n>>>>>>> topic\n}\n";

    /// Auto-resolving pull that stops on a conflict, with the listed file
    /// written into a real directory.
    fn conflicted_pull(dir: &TempDir, listed: &str, content: &str) -> ScriptedRunner {
        fs::write(dir.path().join(listed), content).unwrap();

        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(""));
        runner.on(&["pull", "--rebase"], mock::fail(1, "CONFLICT (content): Merge conflict\n"));
        runner.on(&["status"], mock::ok("interactive rebase in progress; onto abc123\n"));
        runner.on(&["status"], mock::ok("On branch main\n"));
        runner.on(&["diff", "--name-only"], mock::ok(&format!("{}\n", listed)));
        runner.on(
            &["rev-parse", "--show-toplevel"],
            mock::ok(&format!("{}\n", dir.path().display())),
        );
        runner.on(&["add", "."], mock::ok(""));
        runner.on(&["rebase", "--continue"], mock::ok(""));
        runner.on(&["rebase", "--abort"], mock::ok(""));
        runner
    }

    fn auto() -> WorkflowSettings {
        WorkflowSettings {
            auto_resolve: Some(true),
            ..WorkflowSettings::default()
        }
    }

    #[test]
    fn stale_entry_does_not_block_continue() {
        let dir = TempDir::new().unwrap();
        let runner = conflicted_pull(&dir, "stale.rs", "fn main() {}\n");
        let prompter = ScriptedPrompter::new().choose(CONTINUE);

        let result = run(&runner, &prompter, &auto(), Some(Operation::Pull));

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert_eq!(runner.count(&["add", "."]), 1);
        assert_eq!(runner.count(&["rebase", "--continue"]), 1);
    }

    #[test]
    fn marker_file_blocks_continue() {
        let dir = TempDir::new().unwrap();
        let runner = conflicted_pull(&dir, "main.rs", MARKED);
        let prompter = ScriptedPrompter::new().choose(CONTINUE).choose(ABORT);

        let result = run(&runner, &prompter, &auto(), Some(Operation::Pull));

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
        assert_eq!(runner.count(&["add", "."]), 0);
        assert_eq!(runner.count(&["rebase", "--continue"]), 0);
        assert_eq!(runner.count(&["rebase", "--abort"]), 1);
        // Offered twice: once initially, once after the refused continue.
        let offers = prompter
            .asked()
            .into_iter()
            .filter(|a| a.prompt.contains(CONFLICT_PROMPT))
            .count();
        assert_eq!(offers, 2);
    }

    #[test]
    fn missing_listed_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let runner = conflicted_pull(&dir, "gone.rs", "");
        fs::remove_file(dir.path().join("gone.rs")).unwrap();
        let prompter = ScriptedPrompter::new().choose(CONTINUE);

        let result = run(&runner, &prompter, &auto(), Some(Operation::Pull));

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
    }
}

// =============================================================================
// Pull, commit, merge, stash
// =============================================================================

mod other_flows {
    use super::*;

    #[test]
    fn commit_without_changes_never_commits() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(""));

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::Commit),
        );

        assert!(matches!(result.outcome, Outcome::NoOp { .. }));
        assert_eq!(runner.count(&["commit"]), 0);
        assert_eq!(runner.count(&["add"]), 0);
    }

    #[test]
    fn commit_and_push_skips_push_on_no_op() {
        let runner = clean_in_sync_repo();

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::CommitAndPush),
        );

        assert!(matches!(result.outcome, Outcome::NoOp { .. }));
        assert_eq!(runner.count(&["push"]), 0);
    }

    #[test]
    fn commit_and_push_pushes_after_commit() {
        let runner = repo(&[" M a.rs\n", ""], OID_A);
        runner.on(&["add", "."], mock::ok(""));
        runner.on(&["commit"], mock::ok("[main 1a2b3c4] feat: thing\n"));
        runner.on(&["push"], mock::ok(""));
        let prompter = ScriptedPrompter::new()
            .choose(CommitType::Feature.label())
            .text("thing");

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::CommitAndPush),
        );

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert!(runner.position(&["commit"]) < runner.position(&["push"]));
        let commit = runner
            .calls()
            .into_iter()
            .find(|c| c.starts_with(&["commit"]))
            .unwrap();
        assert_eq!(commit.args, vec!["commit", "-m", "feat: thing"]);
    }

    #[test]
    fn merge_destinations_exclude_source() {
        let runner = ScriptedRunner::new();
        runner.on(&["branch", "-a"], mock::ok("  main\n* dev\n  feat\n"));
        runner.on(&["checkout"], mock::ok(""));
        runner.on(&["merge"], mock::ok("Fast-forward\n"));
        let prompter = ScriptedPrompter::new().choose("dev").choose("main");

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Merge {
                source: None,
                destination: None,
            }),
        );

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert_eq!(
            prompter.options_for("into which branch").unwrap(),
            vec!["main".to_string(), "feat".to_string()]
        );
        assert_eq!(
            runner.command_lines(),
            vec!["branch -a", "checkout main", "merge dev"]
        );
    }

    #[test]
    fn failed_checkout_skips_merge() {
        let runner = ScriptedRunner::new();
        runner.on(&["branch", "-a"], mock::ok("  main\n* dev\n"));
        runner.on(
            &["checkout"],
            mock::fail(1, "error: Your local changes would be overwritten by checkout"),
        );

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::Merge {
                source: Some("dev".into()),
                destination: Some("main".into()),
            }),
        );

        assert!(matches!(result.outcome, Outcome::Failed { .. }));
        assert_eq!(result.outcome.exit_code(), 1);
        assert_eq!(runner.count(&["merge"]), 0);
    }

    #[test]
    fn single_branch_cannot_merge() {
        let runner = ScriptedRunner::new();
        runner.on(&["branch", "-a"], mock::ok("* main\n"));

        let result = run(
            &runner,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Some(Operation::Merge {
                source: None,
                destination: None,
            }),
        );

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
    }

    #[test]
    fn pull_already_up_to_date_is_no_op() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(""));
        runner.on(&["pull"], mock::ok("Already up to date.\n"));
        let settings = WorkflowSettings {
            auto_resolve: Some(false),
            ..WorkflowSettings::default()
        };

        let result = run(&runner, &ScriptedPrompter::new(), &settings, Some(Operation::Pull));

        assert!(matches!(result.outcome, Outcome::NoOp { .. }));
        assert_eq!(runner.count_exact(&["pull"]), 1);
    }

    #[test]
    fn rebase_pull_with_nothing_new_is_no_op() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(""));
        runner.on(
            &["pull", "--rebase"],
            mock::ok("Current branch main is up to date.\n"),
        );
        let settings = WorkflowSettings {
            auto_resolve: Some(true),
            ..WorkflowSettings::default()
        };

        let result = run(&runner, &ScriptedPrompter::new(), &settings, Some(Operation::Pull));

        assert!(matches!(result.outcome, Outcome::NoOp { .. }), "{:?}", result.outcome);
        assert_eq!(runner.count_exact(&["pull", "--rebase"]), 1);
    }

    #[test]
    fn pull_with_local_changes_offers_stash() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(" M a.rs\n"));
        runner.on(&["stash", "push"], mock::ok("Saved working directory\n"));
        runner.on(&["pull"], mock::ok("Updating 1a2b..3c4d\nFast-forward\n"));
        let settings = WorkflowSettings {
            auto_resolve: Some(false),
            ..WorkflowSettings::default()
        };
        let prompter = ScriptedPrompter::new().confirm_with(true);

        let result = run(&runner, &prompter, &settings, Some(Operation::Pull));

        assert!(result.outcome.is_succeeded(), "{:?}", result.outcome);
        assert!(runner.position(&["stash"]) < runner.position(&["pull"]));
        let stash = runner
            .calls()
            .into_iter()
            .find(|c| c.starts_with(&["stash"]))
            .unwrap();
        assert!(stash.args[3].starts_with("care: "));
    }

    #[test]
    fn declined_stash_aborts_pull() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok(" M a.rs\n"));
        let settings = WorkflowSettings {
            auto_resolve: Some(false),
            ..WorkflowSettings::default()
        };
        let prompter = ScriptedPrompter::new().confirm_with(false);

        let result = run(&runner, &prompter, &settings, Some(Operation::Pull));

        assert!(matches!(result.outcome, Outcome::Aborted { .. }));
        assert_eq!(runner.count(&["pull"]), 0);
        assert_eq!(runner.count(&["stash"]), 0);
    }

    #[test]
    fn stash_uses_typed_label() {
        let runner = ScriptedRunner::new();
        runner.on(&["status", "--porcelain"], mock::ok("?? notes.txt\n"));
        runner.on(&["stash", "push"], mock::ok(""));
        let prompter = ScriptedPrompter::new().text("before refactor");

        let result = run(
            &runner,
            &prompter,
            &WorkflowSettings::default(),
            Some(Operation::Stash),
        );

        assert!(result.outcome.is_succeeded());
        assert_eq!(
            runner.command_lines(),
            vec!["status --porcelain", "stash push -m before refactor"]
        );
    }

    #[test]
    fn missing_git_is_fatal() {
        let runner = ScriptedRunner::new();
        runner.on_launch_error(
            &[],
            RunnerError::NotFound {
                program: "git".into(),
            },
        );
        let settings = WorkflowSettings::default();
        let prompter = ScriptedPrompter::new();
        let mut workflow = Workflow::new(GitCli::new(&runner, None), &prompter, &settings)
            .with_verbosity(Verbosity::Quiet);

        let err = workflow.run(Some(Operation::Push)).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(workflow.history().last(), Some(&WorkflowState::Failed));
    }
}
