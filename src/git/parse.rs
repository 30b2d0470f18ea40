//! git::parse
//!
//! Parsers for git's textual output.
//!
//! # Design
//!
//! Each query has its own parser. Parsers that can meet output they do not
//! understand return [`Parsed::Failed`] carrying the raw text, so an
//! unexpected shape is a value the caller must handle rather than a guess
//! about repository state. Parsers whose every input is meaningful (for
//! example "is this porcelain output non-empty") return plain values.

use std::fmt;

use super::runner::CommandResult;

/// Exit code `git diff --quiet` uses to signal "differences exist".
pub const DIFF_QUIET_DIFFERENCES: i32 = 1;

/// Conflict marker line prefixes written into files by a failed merge.
pub const CONFLICT_MARKERS: [&str; 3] = ["<<<<<<< ", "=======", ">>>>>>> "];

/// Outcome of parsing one query's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    /// Output matched the expected shape.
    Ok(T),
    /// Output did not match; the raw text is kept for the error report.
    Failed {
        /// Text that failed to parse
        raw: String,
    },
}

impl<T> Parsed<T> {
    fn failed(raw: impl Into<String>) -> Self {
        Parsed::Failed { raw: raw.into() }
    }

    /// Convert to a `Result`, keeping the raw text on failure.
    pub fn ok(self) -> Result<T, String> {
        match self {
            Parsed::Ok(value) => Ok(value),
            Parsed::Failed { raw } => Err(raw),
        }
    }

    /// Whether parsing succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Parsed::Ok(_))
    }
}

/// Commit counts relative to the remote-tracking branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AheadBehind {
    /// Local commits not on the remote.
    pub ahead: u32,
    /// Remote commits not in the local branch.
    pub behind: u32,
}

impl AheadBehind {
    /// Neither side has commits the other lacks.
    pub fn in_sync(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

impl fmt::Display for AheadBehind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ahead, {} behind", self.ahead, self.behind)
    }
}

/// `status --porcelain`: any non-blank line means uncommitted changes.
pub fn porcelain_has_changes(stdout: &str) -> bool {
    stdout.lines().any(|line| !line.trim().is_empty())
}

/// `diff --cached --quiet`: the exit code carries the answer.
///
/// `0` means nothing staged, `1` means staged changes exist. Any other code,
/// or anything written to stderr, is a failed probe rather than an answer.
pub fn staged_probe(result: &CommandResult) -> Parsed<bool> {
    if !result.stderr.trim().is_empty() {
        return Parsed::failed(result.stderr.trim());
    }
    match result.exit_code {
        0 => Parsed::Ok(false),
        DIFF_QUIET_DIFFERENCES => Parsed::Ok(true),
        code => Parsed::failed(format!("exit code {}", code)),
    }
}

/// `rev-list --left-right --count HEAD...origin/<branch>`: `"<ahead>\t<behind>"`.
pub fn ahead_behind(stdout: &str) -> Parsed<AheadBehind> {
    let trimmed = stdout.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() != 2 {
        return Parsed::failed(trimmed);
    }
    match (fields[0].parse::<u32>(), fields[1].parse::<u32>()) {
        (Ok(ahead), Ok(behind)) => Parsed::Ok(AheadBehind { ahead, behind }),
        _ => Parsed::failed(trimmed),
    }
}

/// `rev-parse HEAD`: a single object id.
pub fn object_id(stdout: &str) -> Parsed<String> {
    let trimmed = stdout.trim();
    if is_object_id(trimmed) {
        Parsed::Ok(trimmed.to_string())
    } else {
        Parsed::failed(trimmed)
    }
}

/// `ls-remote origin HEAD`: `"<oid>\tHEAD"` on the first line.
pub fn remote_head(stdout: &str) -> Parsed<String> {
    let first = stdout.lines().next().unwrap_or("").trim();
    match first.split('\t').next() {
        Some(oid) if is_object_id(oid.trim()) => Parsed::Ok(oid.trim().to_string()),
        _ => Parsed::failed(stdout.trim()),
    }
}

fn is_object_id(text: &str) -> bool {
    matches!(text.len(), 40 | 64) && text.chars().all(|c| c.is_ascii_hexdigit())
}

/// `rev-parse --abbrev-ref HEAD`: one branch name.
///
/// A detached HEAD prints the literal `HEAD`, which is not a branch.
pub fn current_branch(stdout: &str) -> Parsed<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "HEAD" || trimmed.contains(char::is_whitespace) {
        Parsed::failed(trimmed)
    } else {
        Parsed::Ok(trimmed.to_string())
    }
}

/// `branch -a`: one name per line, current branch marked with `* `.
///
/// Symbolic entries (`remotes/origin/HEAD -> origin/main`) and detached-HEAD
/// placeholders are not branches and are dropped.
pub fn branch_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .map(|line| line.strip_prefix("* ").unwrap_or(line).trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains(" -> ") && !line.starts_with('('))
        .map(str::to_string)
        .collect()
}

/// Branches offered as merge destinations once `source` is chosen.
pub fn destination_choices(branches: &[String], source: &str) -> Vec<String> {
    branches
        .iter()
        .filter(|branch| branch.as_str() != source)
        .cloned()
        .collect()
}

/// Plain `status`: look for git's rebase-in-progress phrase.
pub fn rebase_in_progress(status_stdout: &str) -> bool {
    status_stdout.contains("rebase in progress")
}

/// Newline-separated path output (`diff --name-only`, `grep -l`).
pub fn path_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether file content still carries conflict markers.
pub fn has_conflict_markers(content: &str) -> bool {
    content.lines().any(|line| {
        line.starts_with(CONFLICT_MARKERS[0])
            || line.trim_end() == CONFLICT_MARKERS[1]
            || line.starts_with(CONFLICT_MARKERS[2])
    })
}

/// Porcelain lines whose change is not fully staged.
///
/// A line counts as staged when the index column is one of added, modified,
/// deleted, renamed, or copied and the worktree column is blank. Untracked
/// entries and unmerged pairs are reported.
pub fn unstaged_entries(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !is_staged_entry(line))
        .map(str::to_string)
        .collect()
}

fn is_staged_entry(line: &str) -> bool {
    let mut chars = line.chars();
    let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
        return false;
    };
    matches!(index, 'A' | 'M' | 'D' | 'R' | 'C') && worktree == ' '
}

/// A push refused because the remote has commits the local branch lacks.
pub fn is_non_fast_forward_rejection(result: &CommandResult) -> bool {
    !result.success()
        && result.stderr.contains("rejected")
        && result.stderr.contains("non-fast-forward")
}

/// Output from a pull or rebase step that stopped on a conflict.
pub fn reports_conflict(result: &CommandResult) -> bool {
    let text = result.combined_output();
    text.contains("CONFLICT") || text.to_ascii_lowercase().contains("could not apply")
}

/// A rebase step that stopped because resolving left the commit empty.
pub fn reports_empty_commit(result: &CommandResult) -> bool {
    let text = result.combined_output();
    text.contains("No changes")
        || text.contains("nothing to commit")
        || text.contains("is now empty")
}

/// A pull that had nothing to bring in.
///
/// A merge pull prints `Already up to date.` (older git hyphenates it); a
/// rebase pull prints `Current branch <name> is up to date.`
pub fn reports_up_to_date(stdout: &str) -> bool {
    stdout.contains("Already up to date")
        || stdout.contains("Already up-to-date")
        || stdout.lines().any(|line| {
            line.starts_with("Current branch ") && line.trim_end().ends_with("is up to date.")
        })
}
