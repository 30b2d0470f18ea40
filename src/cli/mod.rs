//! cli
//!
//! Command-line interface layer for care.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers and turn their results into exit codes
//!
//! # Architecture
//!
//! The CLI layer is thin. It resolves configuration into
//! [`crate::engine::WorkflowSettings`] and hands off to the engine, the
//! scaffolder or the board client.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "CARE_LOG";

/// Exit code for a workflow that could not launch a required program.
pub const EXIT_FATAL: u8 = 2;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. The returned value
/// is the process exit code.
pub fn run() -> Result<u8> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install a stderr subscriber.
///
/// `$CARE_LOG` wins; otherwise `debug` with `--debug` and `warn` without.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests calling run twice) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
