//! ui::scripted
//!
//! Prompter that answers from a prepared script.
//!
//! Used by tests to drive workflows without a terminal. Every question is
//! recorded together with the options it offered, so a test can assert
//! what the operator would have seen.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::prompts::{PromptError, Prompter, Validator};

/// A prepared answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Pick the option with this label.
    Choose(String),
    /// Yes or no.
    Confirm(bool),
    /// Typed text.
    Text(String),
}

/// A question that was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asked {
    /// Prompt text
    pub prompt: String,
    /// Offered labels (empty for confirm and text)
    pub options: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    answers: VecDeque<Answer>,
    asked: Vec<Asked>,
    rejected: Vec<String>,
}

/// Scripted [`Prompter`].
///
/// Answers are consumed in order. When the script runs out, prompts fail
/// with [`PromptError::Cancelled`]. A text answer the validator rejects is
/// recorded and the next answer is used instead.
///
/// # Panics
///
/// Panics when the next answer has the wrong kind for the question, or
/// names a label that was not offered. Both are mistakes in the test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedPrompter {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a menu choice by label.
    pub fn choose(self, label: &str) -> Self {
        self.push(Answer::Choose(label.to_string()))
    }

    /// Queue a yes/no answer.
    pub fn confirm_with(self, answer: bool) -> Self {
        self.push(Answer::Confirm(answer))
    }

    /// Queue a text answer.
    pub fn text(self, answer: &str) -> Self {
        self.push(Answer::Text(answer.to_string()))
    }

    fn push(self, answer: Answer) -> Self {
        self.inner.lock().unwrap().answers.push_back(answer);
        self
    }

    /// Every question asked so far.
    pub fn asked(&self) -> Vec<Asked> {
        self.inner.lock().unwrap().asked.clone()
    }

    /// Options offered by the first prompt containing `fragment`.
    pub fn options_for(&self, fragment: &str) -> Option<Vec<String>> {
        self.asked()
            .into_iter()
            .find(|a| a.prompt.contains(fragment))
            .map(|a| a.options)
    }

    /// Text answers the validator refused.
    pub fn rejected(&self) -> Vec<String> {
        self.inner.lock().unwrap().rejected.clone()
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inner.lock().unwrap().answers.len()
    }

    fn next(&self, prompt: &str, options: &[String]) -> Result<Answer, PromptError> {
        let mut inner = self.inner.lock().unwrap();
        inner.asked.push(Asked {
            prompt: prompt.to_string(),
            options: options.to_vec(),
        });
        inner.answers.pop_front().ok_or(PromptError::Cancelled)
    }
}

impl Prompter for ScriptedPrompter {
    fn choose_index(&self, prompt: &str, labels: &[String]) -> Result<usize, PromptError> {
        match self.next(prompt, labels)? {
            Answer::Choose(label) => Ok(labels
                .iter()
                .position(|l| *l == label)
                .unwrap_or_else(|| {
                    panic!("'{}' not offered for '{}': {:?}", label, prompt, labels)
                })),
            other => panic!("expected a choice for '{}', script had {:?}", prompt, other),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool, PromptError> {
        match self.next(prompt, &[])? {
            Answer::Confirm(answer) => Ok(answer),
            other => panic!("expected a confirmation for '{}', script had {:?}", prompt, other),
        }
    }

    fn ask_text(&self, prompt: &str, validate: Validator<'_>) -> Result<String, PromptError> {
        loop {
            match self.next(prompt, &[])? {
                Answer::Text(text) => {
                    let text = text.trim().to_string();
                    if validate(&text).is_ok() {
                        return Ok(text);
                    }
                    self.inner.lock().unwrap().rejected.push(text);
                }
                other => panic!("expected text for '{}', script had {:?}", prompt, other),
            }
        }
    }
}
