//! engine::operation
//!
//! What the operator asked for, and the commit message they composed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The intent selected once per workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Stage everything and commit.
    Commit,
    /// Commit, then push if a commit was made.
    CommitAndPush,
    /// Push the current branch.
    Push,
    /// Pull into the current branch.
    Pull,
    /// Merge `source` into `destination`; `None` fields are asked for.
    Merge {
        /// Branch to merge from
        source: Option<String>,
        /// Branch to merge into
        destination: Option<String>,
    },
    /// Stash local changes under a label.
    Stash,
}

impl Operation {
    /// Operations offered when none was given on the command line.
    pub fn menu() -> Vec<Operation> {
        vec![
            Operation::Commit,
            Operation::CommitAndPush,
            Operation::Push,
            Operation::Pull,
            Operation::Merge {
                source: None,
                destination: None,
            },
            Operation::Stash,
        ]
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Commit => "Commit",
            Operation::CommitAndPush => "Commit and push",
            Operation::Push => "Push",
            Operation::Pull => "Pull",
            Operation::Merge { .. } => "Merge",
            Operation::Stash => "Stash local changes",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Merge {
                source: Some(source),
                destination: Some(destination),
            } => write!(f, "merge {} into {}", source, destination),
            other => write!(f, "{}", other.label().to_lowercase()),
        }
    }
}

/// Conventional prefix for a commit subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// Restructuring without behavior change
    Refactor,
    /// Bug fix
    Fix,
    /// Formatting only
    Style,
    /// New functionality
    #[serde(rename = "feat")]
    Feature,
}

impl CommitType {
    /// All types, in menu order.
    pub const ALL: [CommitType; 4] = [
        CommitType::Refactor,
        CommitType::Fix,
        CommitType::Style,
        CommitType::Feature,
    ];

    /// Tag written in front of the message.
    pub fn tag(&self) -> &'static str {
        match self {
            CommitType::Refactor => "refactor",
            CommitType::Fix => "fix",
            CommitType::Style => "style",
            CommitType::Feature => "feat",
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            CommitType::Refactor => "refactor: restructure code",
            CommitType::Fix => "fix: repair a bug",
            CommitType::Style => "style: formatting only",
            CommitType::Feature => "feat: add a feature",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed, non-empty commit message.
///
/// Formats as `"<tag>: <body>"`. The formatted line is handed to git as a
/// single argv entry, so quotes and shell metacharacters need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    kind: CommitType,
    body: String,
}

impl CommitMessage {
    /// Build a message; `None` if the body is blank.
    pub fn new(kind: CommitType, body: &str) -> Option<Self> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            body: body.to_string(),
        })
    }

    /// The commit type.
    pub fn kind(&self) -> CommitType {
        self.kind
    }

    /// The trimmed body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.tag(), self.body)
    }
}
