//! Integration tests against real git repositories.
//!
//! These tests create repositories (and a bare remote) in temp dirs and run
//! the inspector and workflows through the system runner.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use carework::engine::{CommitType, Operation, Outcome, Workflow, WorkflowSettings};
use carework::git::{AheadBehind, GitCli, Inspector, SystemRunner};
use carework::ui::{ScriptedPrompter, Verbosity};

/// Run a git command in the given directory, panicking on failure.
fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn configure_identity(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A bare remote plus any number of clones.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Bare remote with one commit on `main`.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let remote = dir.path().join("remote.git");
        fs::create_dir(&remote).unwrap();
        run_git(&remote, &["init", "--bare"]);
        run_git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let seed = dir.path().join("seed");
        fs::create_dir(&seed).unwrap();
        run_git(&seed, &["init"]);
        run_git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_identity(&seed);
        fs::write(seed.join("README.md"), "# Test Repo\n").unwrap();
        run_git(&seed, &["add", "README.md"]);
        run_git(&seed, &["commit", "-m", "Initial commit"]);
        run_git(&seed, &["remote", "add", "origin", remote.to_str().unwrap()]);
        run_git(&seed, &["push", "origin", "main"]);

        Self { dir }
    }

    fn remote(&self) -> PathBuf {
        self.dir.path().join("remote.git")
    }

    /// Clone the remote into `name`.
    fn clone(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        run_git(
            self.dir.path(),
            &["clone", self.remote().to_str().unwrap(), name],
        );
        configure_identity(&path);
        path
    }

    fn remote_log(&self) -> String {
        run_git(&self.remote(), &["log", "--format=%s", "main"])
    }
}

fn commit_file(repo: &Path, path: &str, content: &str, message: &str) {
    fs::write(repo.join(path), content).unwrap();
    run_git(repo, &["add", path]);
    run_git(repo, &["commit", "-m", message]);
}

fn workflow_outcome(
    repo: &Path,
    prompter: &ScriptedPrompter,
    settings: &WorkflowSettings,
    operation: Operation,
) -> Outcome {
    let runner = SystemRunner;
    let git = GitCli::new(&runner, Some(repo));
    let mut workflow = Workflow::new(git, prompter, settings).with_verbosity(Verbosity::Quiet);
    workflow.run(Some(operation)).expect("workflow error")
}

mod inspector {
    use super::*;

    #[test]
    fn change_detection() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        assert!(!inspector.has_uncommitted_changes().unwrap());
        assert!(!inspector.has_staged_changes().unwrap());

        fs::write(repo.join("new.txt"), "hello\n").unwrap();
        assert!(inspector.has_uncommitted_changes().unwrap());
        assert!(!inspector.has_staged_changes().unwrap());

        run_git(&repo, &["add", "new.txt"]);
        assert!(inspector.has_staged_changes().unwrap());
    }

    #[test]
    fn branch_queries() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        run_git(&repo, &["branch", "feature"]);
        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        assert_eq!(inspector.current_branch().unwrap(), "main");
        let branches = inspector.branches().unwrap();
        assert!(branches.contains(&"main".to_string()));
        assert!(branches.contains(&"feature".to_string()));
        assert!(inspector.remote_branch_exists("main").unwrap());
        assert!(!inspector.remote_branch_exists("feature").unwrap());
    }

    #[test]
    fn ahead_and_behind_counts() {
        let fixture = Fixture::new();
        let mine = fixture.clone("mine");
        let theirs = fixture.clone("theirs");
        commit_file(&theirs, "theirs.txt", "x\n", "their change");
        run_git(&theirs, &["push", "origin", "main"]);
        commit_file(&mine, "mine.txt", "y\n", "my change");

        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&mine)), "origin");

        assert!(!inspector.is_up_to_date().unwrap());
        assert_eq!(
            inspector.ahead_behind("main").unwrap(),
            AheadBehind {
                ahead: 1,
                behind: 1
            }
        );
    }

    #[test]
    fn in_sync_clone_is_up_to_date() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        assert!(inspector.is_up_to_date().unwrap());
        assert!(inspector.ahead_behind("main").unwrap().in_sync());
        assert!(!inspector.rebase_in_progress().unwrap());
        assert!(inspector.conflicted_files().unwrap().is_empty());
    }

    #[test]
    fn marker_scan_finds_tracked_files() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        assert!(inspector.files_with_conflict_markers().unwrap().is_empty());

        commit_file(
            &repo,
            "notes.md",
            "intro\n<<<<<<< HEAD\nmine\n=======\ntheirs\n>>>>>>> other\n",
            "oops",
        );
        assert_eq!(
            inspector.files_with_conflict_markers().unwrap(),
            vec!["notes.md".to_string()]
        );
    }

    #[test]
    fn marker_scan_covers_tree_from_subdirectory() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        commit_file(&repo, "top.rs", "<<<<<<< HEAD\na\n=======\nb\n>>>>>>> x\n", "oops");
        fs::create_dir(repo.join("sub")).unwrap();
        commit_file(&repo, "sub/inner.rs", "fn main() {}\n", "inner");

        let runner = SystemRunner;
        let sub = repo.join("sub");
        let inspector = Inspector::new(GitCli::new(&runner, Some(&sub)), "origin");

        assert_eq!(
            inspector.files_with_conflict_markers().unwrap(),
            vec!["top.rs".to_string()]
        );
    }

    #[test]
    fn non_utf8_merge_conflict_is_confirmed() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        fs::write(repo.join("f.txt"), b"caf\xe9 base\n").unwrap();
        run_git(&repo, &["add", "f.txt"]);
        run_git(&repo, &["commit", "-m", "base"]);
        run_git(&repo, &["checkout", "-b", "other"]);
        fs::write(repo.join("f.txt"), b"caf\xe9 other\n").unwrap();
        run_git(&repo, &["commit", "-am", "other"]);
        run_git(&repo, &["checkout", "main"]);
        fs::write(repo.join("f.txt"), b"caf\xe9 main\n").unwrap();
        run_git(&repo, &["commit", "-am", "main"]);
        let merge = Command::new("git")
            .args(["merge", "other"])
            .current_dir(&repo)
            .output()
            .unwrap();
        assert!(!merge.status.success());

        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        let conflicts = inspector.conflicted_files().unwrap();
        assert!(conflicts.contains("f.txt"), "{:?}", conflicts);
    }

    #[test]
    fn capture_reports_everything() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        fs::write(repo.join("README.md"), "# Changed\n").unwrap();
        let runner = SystemRunner;
        let inspector = Inspector::new(GitCli::new(&runner, Some(&repo)), "origin");

        let state = inspector.capture().unwrap();

        assert_eq!(state.current_branch, "main");
        assert!(state.has_uncommitted_changes);
        assert!(!state.has_staged_changes);
        assert_eq!(state.ahead_behind, Some(AheadBehind::default()));
        assert!(!state.rebase_in_progress);
    }
}

mod workflows {
    use super::*;

    #[test]
    fn commit_message_survives_shell_characters() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        fs::write(repo.join("a.txt"), "a\n").unwrap();
        let prompter = ScriptedPrompter::new()
            .choose(CommitType::Fix.label())
            .text("handle \"quoted\" $HOME && `ls`");

        let outcome = workflow_outcome(
            &repo,
            &prompter,
            &WorkflowSettings::default(),
            Operation::Commit,
        );

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        assert_eq!(
            run_git(&repo, &["log", "-1", "--format=%s"]).trim(),
            "fix: handle \"quoted\" $HOME && `ls`"
        );
    }

    #[test]
    fn push_reaches_remote() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        commit_file(&repo, "b.txt", "b\n", "add b");

        let outcome = workflow_outcome(
            &repo,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Operation::Push,
        );

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        assert!(fixture.remote_log().contains("add b"));
    }

    #[test]
    fn new_branch_push_sets_upstream() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        run_git(&repo, &["checkout", "-b", "topic"]);
        commit_file(&repo, "t.txt", "t\n", "topic work");

        let outcome = workflow_outcome(
            &repo,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Operation::Push,
        );

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        let upstream = run_git(&repo, &["rev-parse", "--abbrev-ref", "topic@{upstream}"]);
        assert_eq!(upstream.trim(), "origin/topic");
    }

    #[test]
    fn diverged_branch_is_rebased_then_pushed() {
        let fixture = Fixture::new();
        let mine = fixture.clone("mine");
        let theirs = fixture.clone("theirs");
        commit_file(&theirs, "theirs.txt", "x\n", "their change");
        run_git(&theirs, &["push", "origin", "main"]);
        commit_file(&mine, "mine.txt", "y\n", "my change");

        let settings = WorkflowSettings {
            auto_resolve: Some(true),
            ..WorkflowSettings::default()
        };
        let outcome = workflow_outcome(&mine, &ScriptedPrompter::new(), &settings, Operation::Push);

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        let log = fixture.remote_log();
        assert!(log.contains("my change"));
        assert!(log.contains("their change"));
    }

    #[test]
    fn dirty_push_leaves_remote_untouched() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        commit_file(&repo, "c.txt", "c\n", "committed");
        fs::write(repo.join("c.txt"), "changed\n").unwrap();

        let outcome = workflow_outcome(
            &repo,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Operation::Push,
        );

        assert!(matches!(outcome, Outcome::Aborted { .. }));
        assert!(!fixture.remote_log().contains("committed"));
    }

    #[test]
    fn pull_fast_forwards() {
        let fixture = Fixture::new();
        let mine = fixture.clone("mine");
        let theirs = fixture.clone("theirs");
        commit_file(&theirs, "theirs.txt", "x\n", "their change");
        run_git(&theirs, &["push", "origin", "main"]);

        let settings = WorkflowSettings {
            auto_resolve: Some(false),
            ..WorkflowSettings::default()
        };
        let outcome = workflow_outcome(&mine, &ScriptedPrompter::new(), &settings, Operation::Pull);

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        assert!(mine.join("theirs.txt").exists());

        let again = workflow_outcome(&mine, &ScriptedPrompter::new(), &settings, Operation::Pull);
        assert!(matches!(again, Outcome::NoOp { .. }), "{:?}", again);
    }

    #[test]
    fn merge_checks_out_destination_first() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        run_git(&repo, &["checkout", "-b", "feature"]);
        commit_file(&repo, "f.txt", "f\n", "feature work");
        run_git(&repo, &["checkout", "main"]);

        let outcome = workflow_outcome(
            &repo,
            &ScriptedPrompter::new(),
            &WorkflowSettings::default(),
            Operation::Merge {
                source: Some("feature".into()),
                destination: Some("main".into()),
            },
        );

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        assert!(repo.join("f.txt").exists());
        assert_eq!(run_git(&repo, &["rev-parse", "--abbrev-ref", "HEAD"]).trim(), "main");
    }

    #[test]
    fn stash_saves_changes_with_label() {
        let fixture = Fixture::new();
        let repo = fixture.clone("work");
        fs::write(repo.join("README.md"), "# edited\n").unwrap();
        let prompter = ScriptedPrompter::new().text("");

        let outcome = workflow_outcome(
            &repo,
            &prompter,
            &WorkflowSettings::default(),
            Operation::Stash,
        );

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        let list = run_git(&repo, &["stash", "list"]);
        assert!(list.contains("care: "), "{}", list);
        assert!(run_git(&repo, &["status", "--porcelain"]).trim().is_empty());
    }
}
