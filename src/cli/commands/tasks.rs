//! cli::commands::tasks
//!
//! List board tasks and start their timers.
//!
//! # Design
//!
//! The board client is async. Each handler builds a tokio runtime, blocks
//! on one async function and drops the runtime when done. The async
//! functions take the board and prompter as trait objects so tests can
//! drive them with [`MockBoard`](crate::board::mock::MockBoard).

use super::{interactive, load_config};
use crate::board::{MondayBoard, Task, TaskBoard};
use crate::core::config::Config;
use crate::engine::{Context, Outcome};
use crate::ui::{choose_one, output, Choice, PromptError, Prompter, TerminalPrompter};
use anyhow::{anyhow, Context as _, Result};

/// What to do with the selected task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskAction {
    Details,
    StartTimer,
}

const TASK_PROMPT: &str = "Select a task:";
const ACTION_PROMPT: &str = "What would you like to do?";

/// Run `tasks list`.
pub fn tasks_list(ctx: &Context, board: Option<&str>) -> Result<u8> {
    let config = load_config(None)?;
    let board_id = board_id(&config, board)?;
    let client = client(&config)?;
    let interactive = interactive(ctx, &config);
    let prompter = TerminalPrompter::stdio(interactive);

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(list_tasks(&client, &prompter, &board_id, interactive))?;
    Ok(super::report_outcome(&outcome, ctx.verbosity()))
}

/// Run `tasks timer`.
pub fn tasks_timer(ctx: &Context, task_id: &str, board: Option<&str>) -> Result<u8> {
    let config = load_config(None)?;
    let board_id = board_id(&config, board)?;
    let client = client(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.start_timer(&board_id, task_id))
        .with_context(|| format!("Failed to start timer for task {}", task_id))?;
    output::print(format!("Timer started for task {}", task_id), ctx.verbosity());
    Ok(0)
}

fn board_id(config: &Config, given: Option<&str>) -> Result<String> {
    given
        .or(config.board_id())
        .map(String::from)
        .ok_or_else(|| anyhow!("No board given; pass --board or set board.board_id"))
}

fn client(config: &Config) -> Result<MondayBoard> {
    let token = config
        .board_credential()
        .ok_or(crate::board::BoardError::MissingCredential)?;
    let client = MondayBoard::new(
        config.board_base_url(),
        token,
        config.time_column().map(String::from),
    )?;
    Ok(client)
}

/// List incomplete tasks, then let the operator act on one.
///
/// Without prompts the list is printed and nothing else happens.
pub(crate) async fn list_tasks(
    board: &dyn TaskBoard,
    prompter: &dyn Prompter,
    board_id: &str,
    interactive: bool,
) -> Result<Outcome> {
    let tasks = board
        .incomplete_tasks(board_id)
        .await
        .with_context(|| format!("Failed to fetch tasks from board {}", board_id))?;

    if tasks.is_empty() {
        return Ok(Outcome::no_op("no incomplete tasks found"));
    }

    if !interactive {
        let lines: Vec<String> = tasks.iter().map(task_label).collect();
        return Ok(Outcome::succeeded(output::format_list(&lines, "")));
    }

    let options = tasks
        .iter()
        .map(|t| Choice::new(task_label(t), t))
        .collect();
    let task = match choose_one(prompter, TASK_PROMPT, options) {
        Ok(task) => task,
        Err(PromptError::Cancelled) => return Ok(Outcome::aborted("prompt cancelled")),
        Err(err) => return Err(err.into()),
    };

    let actions = vec![
        Choice::new("View task details", TaskAction::Details),
        Choice::new("Start timer", TaskAction::StartTimer),
    ];
    let action = match choose_one(prompter, ACTION_PROMPT, actions) {
        Ok(action) => action,
        Err(PromptError::Cancelled) => return Ok(Outcome::aborted("prompt cancelled")),
        Err(err) => return Err(err.into()),
    };

    match action {
        TaskAction::Details => Ok(Outcome::succeeded(details(task))),
        TaskAction::StartTimer => {
            board
                .start_timer(board_id, &task.id)
                .await
                .with_context(|| format!("Failed to start timer for task {}", task.id))?;
            Ok(Outcome::succeeded(format!("Timer started for {}", task.name)))
        }
    }
}

fn task_label(task: &Task) -> String {
    format!("{} (#{})", task.name, task.id)
}

fn details(task: &Task) -> String {
    let mut lines = vec![
        format!("Task:    {}", task.name),
        format!("Id:      {}", task.id),
    ];
    if let Some(state) = &task.state {
        lines.push(format!("State:   {}", state));
    }
    if let Some(creator) = &task.creator {
        lines.push(format!("Creator: {} ({})", creator.name, creator.id));
    }
    lines.join("\n")
}
