//! git::inspector
//!
//! Read-only queries against the repository.
//!
//! # Design
//!
//! Each query is one git invocation (or a short fixed sequence) plus a
//! parser from [`super::parse`]. Results are never cached: the workflow
//! asks again right before every decision, because its own previous step
//! may have changed the answer.
//!
//! Failures propagate. A command that exits non-zero becomes
//! [`InspectError::CommandFailed`] with git's stderr, and output no parser
//! recognizes becomes [`InspectError::StateAmbiguous`]. Neither is ever
//! read as a particular repository state.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use super::parse::{self, AheadBehind};
use super::runner::{CommandResult, RunnerError};
use super::GitCli;

/// Errors from repository queries.
#[derive(Debug, Error)]
pub enum InspectError {
    /// git could not be launched.
    #[error(transparent)]
    Launch(#[from] RunnerError),

    /// git ran and reported failure.
    #[error("git {command} failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Exit code reported
        exit_code: i32,
        /// Captured error text
        stderr: String,
    },

    /// git's output did not match any expected shape.
    #[error("unexpected output from git {command}: {raw:?}")]
    StateAmbiguous {
        /// Command line whose output was not understood
        command: String,
        /// The raw output
        raw: String,
    },

    /// A file git listed could not be read.
    #[error("could not read {}: {source}", path.display())]
    ReadFailed {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

/// Snapshot of everything the inspector can tell about the repository.
///
/// Built for display by `care status`. Workflows query individual facts
/// instead of holding one of these across steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    /// Working tree or index differs from HEAD.
    pub has_uncommitted_changes: bool,
    /// Index differs from HEAD.
    pub has_staged_changes: bool,
    /// Counts against the remote-tracking branch, if it exists.
    pub ahead_behind: Option<AheadBehind>,
    /// A rebase is stopped mid-way.
    pub rebase_in_progress: bool,
    /// Files still carrying conflict markers.
    pub conflicted_files: BTreeSet<String>,
    /// Checked-out branch.
    pub current_branch: String,
    /// Local and remote branches.
    pub branches: Vec<String>,
}

/// Repository queries for one working directory.
#[derive(Debug, Clone, Copy)]
pub struct Inspector<'a> {
    git: GitCli<'a>,
    remote: &'a str,
}

impl<'a> Inspector<'a> {
    /// Create an inspector that compares against `remote`.
    pub fn new(git: GitCli<'a>, remote: &'a str) -> Self {
        Self { git, remote }
    }

    /// Remote the sync queries compare against.
    pub fn remote(&self) -> &str {
        self.remote
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandResult, InspectError> {
        let result = self.git.run(args)?;
        if result.success() {
            Ok(result)
        } else {
            Err(InspectError::CommandFailed {
                command: args.join(" "),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn ambiguous(args: &[&str], raw: String) -> InspectError {
        InspectError::StateAmbiguous {
            command: args.join(" "),
            raw,
        }
    }

    /// Whether `status --porcelain` lists anything.
    pub fn has_uncommitted_changes(&self) -> Result<bool, InspectError> {
        let result = self.run_checked(&["status", "--porcelain"])?;
        Ok(parse::porcelain_has_changes(&result.stdout))
    }

    /// Whether the index differs from HEAD.
    pub fn has_staged_changes(&self) -> Result<bool, InspectError> {
        let args = ["diff", "--cached", "--quiet"];
        let result = self.git.run(&args)?;
        match parse::staged_probe(&result) {
            parse::Parsed::Ok(staged) => Ok(staged),
            parse::Parsed::Failed { raw } => Err(InspectError::CommandFailed {
                command: args.join(" "),
                exit_code: result.exit_code,
                stderr: raw,
            }),
        }
    }

    /// Update remote-tracking refs.
    pub fn fetch(&self) -> Result<(), InspectError> {
        self.run_checked(&["fetch"])?;
        Ok(())
    }

    /// Fetch, then compare local HEAD with the remote's advertised HEAD.
    ///
    /// Any mismatch counts as not up to date; [`Self::ahead_behind`] tells
    /// which direction.
    pub fn is_up_to_date(&self) -> Result<bool, InspectError> {
        self.fetch()?;

        let local_args = ["rev-parse", "HEAD"];
        let local = self.run_checked(&local_args)?;
        let local = parse::object_id(&local.stdout)
            .ok()
            .map_err(|raw| Self::ambiguous(&local_args, raw))?;

        let remote_args = ["ls-remote", self.remote, "HEAD"];
        let remote = self.run_checked(&remote_args)?;
        if remote.stdout.trim().is_empty() {
            debug!(remote = self.remote, "remote advertises no HEAD");
            return Ok(false);
        }
        let remote = parse::remote_head(&remote.stdout)
            .ok()
            .map_err(|raw| Self::ambiguous(&remote_args, raw))?;

        debug!(%local, %remote, "compared heads");
        Ok(local == remote)
    }

    /// Whether `<remote>/<branch>` exists locally after a fetch.
    pub fn remote_branch_exists(&self, branch: &str) -> Result<bool, InspectError> {
        let refname = format!("refs/remotes/{}/{}", self.remote, branch);
        let result = self
            .git
            .run(&["rev-parse", "--verify", "--quiet", &refname])?;
        match result.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            code => Err(InspectError::CommandFailed {
                command: format!("rev-parse --verify --quiet {}", refname),
                exit_code: code,
                stderr: result.stderr.trim().to_string(),
            }),
        }
    }

    /// Fetch, then count commits on each side of `HEAD...<remote>/<branch>`.
    pub fn ahead_behind(&self, branch: &str) -> Result<AheadBehind, InspectError> {
        self.fetch()?;
        let range = format!("HEAD...{}/{}", self.remote, branch);
        let args = ["rev-list", "--left-right", "--count", range.as_str()];
        let result = self.run_checked(&args)?;
        parse::ahead_behind(&result.stdout)
            .ok()
            .map_err(|raw| Self::ambiguous(&args, raw))
    }

    /// Whether `status` reports a rebase in progress.
    pub fn rebase_in_progress(&self) -> Result<bool, InspectError> {
        let result = self.run_checked(&["status"])?;
        Ok(parse::rebase_in_progress(&result.stdout))
    }

    /// Paths git lists as unmerged, unconfirmed.
    pub fn listed_conflicts(&self) -> Result<Vec<String>, InspectError> {
        let result = self.run_checked(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(parse::path_list(&result.stdout))
    }

    /// Unmerged paths whose content still carries conflict markers.
    ///
    /// The path list alone can be stale, so each entry is opened and
    /// scanned as bytes. Entries that no longer exist or hold no markers are
    /// dropped; any other read error is returned.
    pub fn conflicted_files(&self) -> Result<BTreeSet<String>, InspectError> {
        let listed = self.listed_conflicts()?;
        if listed.is_empty() {
            return Ok(BTreeSet::new());
        }

        let root = self.repo_root()?;
        let mut confirmed = BTreeSet::new();
        for path in listed {
            let full = root.join(&path);
            match fs::read(&full) {
                Ok(bytes) if parse::has_conflict_markers(&String::from_utf8_lossy(&bytes)) => {
                    confirmed.insert(path);
                }
                Ok(_) => debug!(%path, "listed as unmerged but has no markers"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!(%path, "listed conflict no longer exists")
                }
                Err(source) => return Err(InspectError::ReadFailed { path: full, source }),
            }
        }
        Ok(confirmed)
    }

    /// Top-level directory of the working tree.
    pub fn repo_root(&self) -> Result<PathBuf, InspectError> {
        let args = ["rev-parse", "--show-toplevel"];
        let result = self.run_checked(&args)?;
        let root = result.stdout.trim();
        if root.is_empty() {
            return Err(Self::ambiguous(&args, result.stdout));
        }
        Ok(PathBuf::from(root))
    }

    /// Tracked files anywhere in the tree that contain conflict markers.
    ///
    /// Matches the start and end markers only; a bare `=======` line also
    /// appears in ordinary documents. The `:/` pathspec covers the whole
    /// work tree from any subdirectory, and paths come back relative to the
    /// root.
    pub fn files_with_conflict_markers(&self) -> Result<Vec<String>, InspectError> {
        let args = [
            "grep",
            "-l",
            "-I",
            "--full-name",
            "-E",
            "^(<<<<<<< |>>>>>>> )",
            "--",
            ":/",
        ];
        let result = self.git.run(&args)?;
        match result.exit_code {
            0 => Ok(parse::path_list(&result.stdout)),
            1 if result.stderr.trim().is_empty() => Ok(Vec::new()),
            code => Err(InspectError::CommandFailed {
                command: args.join(" "),
                exit_code: code,
                stderr: result.stderr.trim().to_string(),
            }),
        }
    }

    /// Porcelain lines that are not fully staged.
    pub fn unstaged_entries(&self) -> Result<Vec<String>, InspectError> {
        let result = self.run_checked(&["status", "--porcelain"])?;
        Ok(parse::unstaged_entries(&result.stdout))
    }

    /// Name of the checked-out branch.
    pub fn current_branch(&self) -> Result<String, InspectError> {
        let args = ["rev-parse", "--abbrev-ref", "HEAD"];
        let result = self.run_checked(&args)?;
        parse::current_branch(&result.stdout)
            .ok()
            .map_err(|raw| Self::ambiguous(&args, raw))
    }

    /// Local and remote branches.
    pub fn branches(&self) -> Result<Vec<String>, InspectError> {
        let result = self.run_checked(&["branch", "-a"])?;
        Ok(parse::branch_list(&result.stdout))
    }

    /// Run every query and collect the answers.
    pub fn capture(&self) -> Result<RepoState, InspectError> {
        let current_branch = self.current_branch()?;
        self.fetch()?;
        let ahead_behind = if self.remote_branch_exists(&current_branch)? {
            Some(self.ahead_behind(&current_branch)?)
        } else {
            None
        };

        Ok(RepoState {
            has_uncommitted_changes: self.has_uncommitted_changes()?,
            has_staged_changes: self.has_staged_changes()?,
            ahead_behind,
            rebase_in_progress: self.rebase_in_progress()?,
            conflicted_files: self.conflicted_files()?,
            current_branch,
            branches: self.branches()?,
        })
    }
}
