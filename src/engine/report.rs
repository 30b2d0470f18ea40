//! engine::report
//!
//! Classifies the result of one command and renders a one-line status.
//!
//! # Classification
//!
//! First match wins:
//!
//! 1. The process could not be launched: [`Classification::Fatal`].
//! 2. Non-zero exit: [`Classification::Failure`] with stderr as the message.
//! 3. Exit 0 but stderr carries an error marker and is not the remote
//!    summary (which starts with `To `): [`Classification::Failure`].
//! 4. Otherwise [`Classification::Success`]. stdout, plus stderr when it is
//!    informational, becomes the info text.
//!
//! Step 3 exists because git's exit status alone is not trustworthy, and
//! step 4's stderr handling because git writes progress and remote
//! summaries to stderr on success.

use crate::git::{CommandResult, RunnerError};

/// Markers that make stderr an error even on exit 0.
pub const ERROR_MARKERS: [&str; 2] = ["error:", "fatal:"];

/// Prefix of the push/pull summary line git writes to stderr.
pub const REMOTE_SUMMARY_PREFIX: &str = "To ";

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// It worked.
    Success,
    /// It ran and failed.
    Failure,
    /// It could not run at all.
    Fatal,
}

/// Classified result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The command line, for display
    pub command: String,
    /// The verdict
    pub classification: Classification,
    /// Error text for failures; empty on success
    pub message: String,
    /// Informational output on success
    pub info: Option<String>,
}

impl Report {
    /// Whether the command succeeded.
    pub fn is_success(&self) -> bool {
        self.classification == Classification::Success
    }

    /// One-line status.
    pub fn render(&self) -> String {
        match self.classification {
            Classification::Success => match self.info.as_deref().and_then(first_line) {
                Some(line) => format!("ok: {} ({})", self.command, line),
                None => format!("ok: {}", self.command),
            },
            Classification::Failure => format!(
                "failed: {}: {}",
                self.command,
                first_line(&self.message).unwrap_or("no error output")
            ),
            Classification::Fatal => format!("fatal: {}: {}", self.command, self.message),
        }
    }

    /// The command's own words for a failure, for an outcome message.
    pub fn failure_text(&self) -> String {
        if self.message.is_empty() {
            format!("{} failed", self.command)
        } else {
            format!("{} failed: {}", self.command, self.message)
        }
    }
}

/// Classify a command result.
pub fn classify(command: &str, result: &Result<CommandResult, RunnerError>) -> Report {
    let (classification, message, info) = match result {
        Err(err) => (Classification::Fatal, err.to_string(), None),
        Ok(out) if !out.success() => {
            let message = if out.stderr.trim().is_empty() {
                out.stdout.trim().to_string()
            } else {
                out.stderr.trim().to_string()
            };
            (Classification::Failure, message, None)
        }
        Ok(out) if stderr_signals_error(&out.stderr) => {
            (Classification::Failure, out.stderr.trim().to_string(), None)
        }
        Ok(out) => {
            let info = [out.stdout.trim(), out.stderr.trim()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n");
            let info = if info.is_empty() { None } else { Some(info) };
            (Classification::Success, String::new(), info)
        }
    };

    Report {
        command: command.to_string(),
        classification,
        message,
        info,
    }
}

fn stderr_signals_error(stderr: &str) -> bool {
    let stderr = stderr.trim_start();
    !stderr.starts_with(REMOTE_SUMMARY_PREFIX) && ERROR_MARKERS.iter().any(|m| stderr.contains(m))
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
