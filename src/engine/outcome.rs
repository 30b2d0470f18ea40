//! engine::outcome
//!
//! Workflow states and the terminal result of a run.

use std::fmt;

/// States a workflow passes through.
///
/// A run starts at `Idle`, moves to `OperationChosen`, then into the
/// operation's working state, and ends in one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// Nothing selected yet
    Idle,
    /// The operator picked an operation
    OperationChosen,
    /// Commit flow running
    Committing,
    /// Push flow running
    Pushing,
    /// Pull flow running
    Pulling,
    /// Merge flow running
    Merging,
    /// Stash running
    Stashing,
    /// Recovering from a rejected push or a conflicted pull
    Recovering,
    /// Finished successfully (including no-op)
    Succeeded,
    /// Declined by the operator or by a policy gate
    Aborted,
    /// A command failed
    Failed,
}

impl WorkflowState {
    /// Whether the run ends here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Succeeded | WorkflowState::Aborted | WorkflowState::Failed
        )
    }
}

/// How a workflow run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation did what was asked.
    Succeeded {
        /// Summary for the operator
        message: String,
    },
    /// Nothing needed doing.
    NoOp {
        /// Why nothing happened
        reason: String,
    },
    /// The operator or a gate declined to proceed. Not an error.
    Aborted {
        /// Why the run stopped
        reason: String,
    },
    /// A command failed.
    Failed {
        /// What failed, with git's own error text
        message: String,
    },
}

impl Outcome {
    /// Successful outcome.
    pub fn succeeded(message: impl Into<String>) -> Self {
        Outcome::Succeeded {
            message: message.into(),
        }
    }

    /// No-op outcome.
    pub fn no_op(reason: impl Into<String>) -> Self {
        Outcome::NoOp {
            reason: reason.into(),
        }
    }

    /// Declined outcome.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Outcome::Aborted {
            reason: reason.into(),
        }
    }

    /// Failed outcome.
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed {
            message: message.into(),
        }
    }

    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> WorkflowState {
        match self {
            Outcome::Succeeded { .. } | Outcome::NoOp { .. } => WorkflowState::Succeeded,
            Outcome::Aborted { .. } => WorkflowState::Aborted,
            Outcome::Failed { .. } => WorkflowState::Failed,
        }
    }

    /// Process exit code: declining is a valid result of the tool.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Failed { .. } => 1,
            _ => 0,
        }
    }

    /// Whether an actual change was made.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded { message } => write!(f, "{}", message),
            Outcome::NoOp { reason } => write!(f, "Nothing to do: {}", reason),
            Outcome::Aborted { reason } => write!(f, "Aborted: {}", reason),
            Outcome::Failed { message } => write!(f, "Failed: {}", message),
        }
    }
}
