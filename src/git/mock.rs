//! git::mock
//!
//! Scripted command runner for deterministic testing.
//!
//! # Design
//!
//! Responses are keyed by an argument prefix. The longest matching prefix
//! wins, so a test can script `push` and `push --force-with-lease`
//! separately. Each key holds a queue: responses are consumed in order and
//! the last one repeats once the queue is down to it. Every invocation is
//! recorded for later assertions.
//!
//! # Example
//!
//! ```
//! use carework::git::mock::{self, ScriptedRunner};
//! use carework::git::GitCli;
//!
//! let runner = ScriptedRunner::new();
//! runner.on(&["status", "--porcelain"], mock::ok(""));
//!
//! let git = GitCli::new(&runner, None);
//! let result = git.run(&["status", "--porcelain"]).unwrap();
//! assert!(result.success());
//! assert_eq!(runner.count(&["status"]), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::runner::{CommandResult, CommandRunner, RunOptions, RunnerError};

/// Build a successful result with the given stdout.
pub fn ok(stdout: &str) -> CommandResult {
    CommandResult::new(0, stdout, "")
}

/// Build a failed result with the given exit code and stderr.
pub fn fail(exit_code: i32, stderr: &str) -> CommandResult {
    CommandResult::new(exit_code, "", stderr)
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name
    pub program: String,
    /// Arguments as passed
    pub args: Vec<String>,
    /// Environment overrides for this call
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Whether the arguments begin with `prefix`.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }

    /// Arguments joined with spaces.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

#[derive(Debug, Clone)]
enum Response {
    Result(CommandResult),
    Launch(RunnerError),
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    responses: VecDeque<Response>,
}

#[derive(Debug, Default)]
struct Inner {
    rules: Vec<Rule>,
    calls: Vec<Invocation>,
}

/// Runner that answers from a script and records calls.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedRunner {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for invocations starting with `prefix`.
    pub fn on(&self, prefix: &[&str], result: CommandResult) -> &Self {
        self.push(prefix, Response::Result(result));
        self
    }

    /// Queue a launch failure for invocations starting with `prefix`.
    pub fn on_launch_error(&self, prefix: &[&str], error: RunnerError) -> &Self {
        self.push(prefix, Response::Launch(error));
        self
    }

    fn push(&self, prefix: &[&str], response: Response) {
        let mut inner = self.inner.lock().unwrap();
        let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        if let Some(rule) = inner.rules.iter_mut().find(|r| r.prefix == prefix) {
            rule.responses.push_back(response);
        } else {
            inner.rules.push(Rule {
                prefix,
                responses: VecDeque::from([response]),
            });
        }
    }

    /// All invocations so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of invocations whose arguments start with `prefix`.
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Number of invocations whose arguments are exactly `args`.
    pub fn count_exact(&self, args: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.args.len() == args.len() && c.starts_with(args))
            .count()
    }

    /// Index of the first invocation starting with `prefix`.
    pub fn position(&self, prefix: &[&str]) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    /// Command lines of every recorded invocation.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        options: &RunOptions,
    ) -> Result<CommandResult, RunnerError> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: options.env.clone(),
        };

        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(invocation.clone());

        let prefix_matches = |rule: &Rule| {
            let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
            invocation.starts_with(&prefix)
        };
        let rule = inner
            .rules
            .iter_mut()
            .filter(|r| prefix_matches(&**r))
            .max_by_key(|r| r.prefix.len());

        let response = match rule {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front(),
            Some(rule) => rule.responses.front().cloned(),
            None => None,
        };

        match response {
            Some(Response::Result(result)) => Ok(result),
            Some(Response::Launch(err)) => Err(err),
            None => Ok(fail(
                128,
                &format!("fatal: unscripted command: {} {}", program, args.join(" ")),
            )),
        }
    }
}
