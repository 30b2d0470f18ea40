//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Workflows talk to the operator only through [`Prompter`], so the same
//! flow runs against a terminal or a scripted answer list. Every call
//! blocks until an answer is available.
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! [`TerminalPrompter`] refuses with [`PromptError::NotInteractive`] and the
//! caller must have supplied the answer some other way (a flag or config).

use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};
use std::sync::Mutex;

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Input ended before an answer was given.
    #[error("prompt cancelled by user")]
    Cancelled,

    /// A prompt was needed but input is not interactive.
    #[error("not in interactive mode; an answer was required for: {0}")]
    NotInteractive(String),

    /// Terminal read or write failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Validation hook for free-text answers.
///
/// Returns the message to show the operator when the input is rejected.
pub type Validator<'v> = &'v dyn Fn(&str) -> Result<(), String>;

/// The operator-facing decision points.
pub trait Prompter {
    /// Present `labels` and return the index of the chosen one.
    fn choose_index(&self, prompt: &str, labels: &[String]) -> Result<usize, PromptError>;

    /// Yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError>;

    /// Free text, repeated until `validate` accepts it.
    fn ask_text(&self, prompt: &str, validate: Validator<'_>) -> Result<String, PromptError>;
}

/// One menu entry: what the operator sees and what the caller gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<T> {
    /// Displayed text
    pub label: String,
    /// Value returned when chosen
    pub value: T,
}

impl<T> Choice<T> {
    /// Create a choice.
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Ask the operator to pick one of `options` and return its value.
pub fn choose_one<T>(
    prompter: &dyn Prompter,
    prompt: &str,
    options: Vec<Choice<T>>,
) -> Result<T, PromptError> {
    let labels: Vec<String> = options.iter().map(|c| c.label.clone()).collect();
    let index = prompter.choose_index(prompt, &labels)?;
    options
        .into_iter()
        .nth(index)
        .map(|c| c.value)
        .ok_or(PromptError::Cancelled)
}

/// Validator that rejects blank input.
pub fn non_empty(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        Err("a value is required".to_string())
    } else {
        Ok(())
    }
}

/// Validator that accepts anything, including an empty line.
pub fn any_text(_input: &str) -> Result<(), String> {
    Ok(())
}

/// Read a secret without echoing it.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive(message.to_string()));
    }
    Ok(rpassword::prompt_password(format!("{}: ", message))?)
}

/// Line-oriented prompter over any reader and writer.
///
/// Prompts are written to the writer (stderr for the real terminal so that
/// stdout stays clean for command output).
#[derive(Debug)]
pub struct TerminalPrompter<R, W> {
    io: Mutex<(R, W)>,
    interactive: bool,
}

impl TerminalPrompter<BufReader<Stdin>, Stderr> {
    /// Prompter on the process's stdin and stderr.
    pub fn stdio(interactive: bool) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr(), interactive)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    /// Prompter over explicit streams.
    pub fn new(reader: R, writer: W, interactive: bool) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
            interactive,
        }
    }

    /// Recover the streams, e.g. to inspect what was written.
    pub fn into_inner(self) -> (R, W) {
        match self.io.into_inner() {
            Ok(pair) => pair,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn require_interactive(&self, prompt: &str) -> Result<(), PromptError> {
        if self.interactive {
            Ok(())
        } else {
            Err(PromptError::NotInteractive(prompt.to_string()))
        }
    }

    /// Write `text`, then read one line. EOF cancels.
    fn exchange(&self, text: &str) -> Result<String, PromptError> {
        let mut guard = self
            .io
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt streams poisoned"))?;
        let (reader, writer) = &mut *guard;
        write!(writer, "{}", text)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn say(&self, text: &str) -> Result<(), PromptError> {
        let mut guard = self
            .io
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt streams poisoned"))?;
        writeln!(guard.1, "{}", text)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn choose_index(&self, prompt: &str, labels: &[String]) -> Result<usize, PromptError> {
        self.require_interactive(prompt)?;
        if labels.is_empty() {
            return Err(PromptError::Cancelled);
        }

        let mut menu = format!("{}\n", prompt);
        for (i, label) in labels.iter().enumerate() {
            menu.push_str(&format!("  {}. {}\n", i + 1, label));
        }
        self.say(menu.trim_end())?;

        loop {
            let answer = self.exchange("Enter number: ")?;
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=labels.len()).contains(&n) => return Ok(n - 1),
                _ => self.say(&format!(
                    "Invalid selection; enter a number from 1 to {}.",
                    labels.len()
                ))?,
            }
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        self.require_interactive(prompt)?;
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.exchange(&format!("{} {} ", prompt, hint))?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    fn ask_text(&self, prompt: &str, validate: Validator<'_>) -> Result<String, PromptError> {
        self.require_interactive(prompt)?;
        loop {
            let answer = self.exchange(&format!("{}: ", prompt))?;
            let answer = answer.trim().to_string();
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => self.say(&reason)?,
            }
        }
    }
}
