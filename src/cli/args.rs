//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// care - guided Git workflows, project scaffolding and task-board shortcuts
#[derive(Parser, Debug)]
#[command(name = "care")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if care was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether prompts are allowed.
    ///
    /// False with `--no-interactive` or `--quiet`, or when stdin is not a
    /// terminal.
    pub fn interactive(&self) -> bool {
        if self.no_interactive || self.quiet {
            false
        } else {
            std::io::stdin().is_terminal()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a guided Git workflow
    #[command(
        name = "git",
        long_about = "Run a guided Git workflow.\n\n\
            Without a subcommand care asks which workflow to run. Every step \
            re-reads the repository state before deciding what to do, and a \
            push rejected because the remote moved is rebased and retried \
            instead of being forced.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Pick a workflow from a menu
    care git

    # Commit everything with a typed message
    care git commit

    # Push, rebasing onto the remote first if it moved
    care git push --auto-resolve

    # Merge feature into main without the menus
    care git merge --from feature --into main"
    )]
    Git {
        #[command(subcommand)]
        action: Option<GitAction>,

        /// Rebase on pull and walk through conflicts instead of stopping
        #[arg(long, global = true)]
        auto_resolve: bool,
    },

    /// Show what care sees in the repository
    #[command(
        name = "status",
        long_about = "Show the repository state care bases its decisions on.\n\n\
            Runs every query once: pending changes, staged changes, distance \
            from the remote-tracking branch, rebase state and conflicted files."
    )]
    Status,

    /// Create a project from a configured template
    #[command(
        name = "project",
        long_about = "Create a new project by copying a configured template.\n\n\
            The template tree is copied into a new directory, the package.json \
            name is rewritten, and `npm install` runs in the new directory.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Choose template and name interactively
    care project

    # Fully scripted
    care project --template web --name shop --skip-install"
    )]
    Project {
        /// Template name from config
        #[arg(long)]
        template: Option<String>,

        /// Name of the new project directory
        #[arg(long)]
        name: Option<String>,

        /// Do not run `npm install`
        #[arg(long)]
        skip_install: bool,
    },

    /// Work with the task board
    #[command(name = "tasks")]
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show the effective configuration
    care config list

    # Use a merge tool for auto-resolved pulls
    care config set merge_tool meld

    # Store the board credential (prompts without echo)
    care config set board.credential"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    care completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    care completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Git workflows.
#[derive(Subcommand, Debug, Clone)]
pub enum GitAction {
    /// Stage everything and commit with a typed message
    Commit,
    /// Commit, then push if the commit was made
    CommitAndPush,
    /// Push the current branch
    Push,
    /// Pull from the remote
    Pull,
    /// Merge one branch into another
    Merge {
        /// Branch to merge from
        #[arg(long = "from", value_name = "BRANCH")]
        source: Option<String>,

        /// Branch to merge into
        #[arg(long = "into", value_name = "BRANCH")]
        destination: Option<String>,
    },
    /// Stash local changes under a label
    Stash,
}

/// Task-board subcommands.
#[derive(Subcommand, Debug)]
pub enum TasksAction {
    /// List incomplete tasks and act on one
    List {
        /// Board id; defaults to board.board_id
        #[arg(long, short)]
        board: Option<String>,
    },
    /// Start the timer on a task
    Timer {
        /// Task id
        task_id: String,

        /// Board id; defaults to board.board_id
        #[arg(long, short)]
        board: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Key, e.g. `remote` or `board.base_url`
        key: String,
    },
    /// Set one value in the global file
    Set {
        /// Key, e.g. `remote` or `board.base_url`
        key: String,
        /// New value; board.credential is prompted for when omitted
        value: Option<String>,
    },
    /// Print every value
    List,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn git_without_subcommand() {
        let cli = Cli::try_parse_from(["care", "git"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Git {
                action: None,
                auto_resolve: false
            }
        ));
    }

    #[test]
    fn merge_presets() {
        let cli =
            Cli::try_parse_from(["care", "git", "merge", "--from", "feat", "--into", "main"])
                .unwrap();
        match cli.command {
            Command::Git {
                action: Some(GitAction::Merge {
                    source,
                    destination,
                }),
                ..
            } => {
                assert_eq!(source.as_deref(), Some("feat"));
                assert_eq!(destination.as_deref(), Some("main"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn auto_resolve_after_subcommand() {
        let cli = Cli::try_parse_from(["care", "git", "pull", "--auto-resolve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Git {
                action: Some(GitAction::Pull),
                auto_resolve: true
            }
        ));
    }

    #[test]
    fn quiet_disables_prompts() {
        let cli = Cli::try_parse_from(["care", "-q", "status"]).unwrap();
        assert!(!cli.interactive());
    }

    #[test]
    fn config_set_value_is_optional() {
        let cli = Cli::try_parse_from(["care", "config", "set", "board.credential"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Set { value: None, .. }
            }
        ));
    }
}
