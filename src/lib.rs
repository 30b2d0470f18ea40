//! care - guided Git workflows for people who would rather not memorize Git
//!
//! care wraps the everyday commit / push / pull / merge loop in a small state
//! machine that asks before anything destructive, re-reads the repository
//! before every decision, and recovers from a push rejected because the
//! remote moved by rebasing instead of forcing. It also scaffolds projects
//! from template directories and talks to a Monday.com task board.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`engine`] - Workflow state machine, recovery paths and result reporting
//! - [`git`] - Command runner, output parsers and repository queries
//! - [`ui`] - Prompt boundary and user-facing output
//! - [`core`] - Configuration
//! - [`scaffold`] - Project creation from templates
//! - [`board`] - Task-board client
//!
//! # Invariants
//!
//! 1. Every external program is started with an argument vector, never a shell
//! 2. A force push is lease-guarded and follows a whole-tree conflict marker check
//! 3. Declining at a prompt aborts cleanly; it is never reported as a failure

pub mod board;
pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod scaffold;
pub mod ui;
