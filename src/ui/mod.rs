//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - The [`Prompter`] boundary and its terminal implementation
//! - [`scripted`] - Scripted prompter for tests
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All output and prompts go through this module so that interactive and
//! non-interactive modes are handled in one place.

pub mod output;
pub mod prompts;
pub mod scripted;

pub use output::Verbosity;
pub use prompts::{choose_one, Choice, PromptError, Prompter, TerminalPrompter};
pub use scripted::ScriptedPrompter;
