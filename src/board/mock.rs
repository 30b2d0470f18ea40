//! board::mock
//!
//! In-memory task board for deterministic tests.
//!
//! # Example
//!
//! ```
//! use carework::board::mock::MockBoard;
//! use carework::board::{Task, TaskBoard};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let board = MockBoard::new().with_task("42", Task {
//!     id: "1".into(),
//!     name: "Write docs".into(),
//!     state: None,
//!     creator: None,
//! });
//! let tasks = board.incomplete_tasks("42").await.unwrap();
//! assert_eq!(tasks.len(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{BoardError, Task, TaskBoard};

/// Mock board for testing.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBoard {
    inner: Arc<Mutex<MockBoardInner>>,
}

#[derive(Debug, Default)]
struct MockBoardInner {
    boards: HashMap<String, Vec<Task>>,
    running: Vec<String>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which operation should fail, and with what.
#[derive(Debug, Clone)]
pub enum FailOn {
    IncompleteTasks(BoardError),
    TasksByCreator(BoardError),
    StartTimer(BoardError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    IncompleteTasks { board_id: String },
    TasksByCreator { board_id: String, user_id: String },
    StartTimer { board_id: String, task_id: String },
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to a board.
    pub fn with_task(self, board_id: &str, task: Task) -> Self {
        self.inner
            .lock()
            .unwrap()
            .boards
            .entry(board_id.to_string())
            .or_default()
            .push(task);
        self
    }

    /// Make one operation fail.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// All recorded operations, oldest first.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Items whose timer was started.
    pub fn running_timers(&self) -> Vec<String> {
        self.inner.lock().unwrap().running.clone()
    }

    fn items(inner: &MockBoardInner, board_id: &str) -> Result<Vec<Task>, BoardError> {
        inner
            .boards
            .get(board_id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(format!("board {}", board_id)))
    }
}

#[async_trait]
impl TaskBoard for MockBoard {
    async fn incomplete_tasks(&self, board_id: &str) -> Result<Vec<Task>, BoardError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::IncompleteTasks {
            board_id: board_id.to_string(),
        });
        if let Some(FailOn::IncompleteTasks(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let items = Self::items(&inner, board_id)?;
        Ok(items.into_iter().filter(|t| !t.is_done()).collect())
    }

    async fn tasks_by_creator(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> Result<Vec<Task>, BoardError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::TasksByCreator {
            board_id: board_id.to_string(),
            user_id: user_id.to_string(),
        });
        if let Some(FailOn::TasksByCreator(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let items = Self::items(&inner, board_id)?;
        Ok(items
            .into_iter()
            .filter(|t| t.creator.as_ref().is_some_and(|c| c.id == user_id))
            .collect())
    }

    async fn start_timer(&self, board_id: &str, task_id: &str) -> Result<(), BoardError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::StartTimer {
            board_id: board_id.to_string(),
            task_id: task_id.to_string(),
        });
        if let Some(FailOn::StartTimer(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let items = Self::items(&inner, board_id)?;
        if !items.iter().any(|t| t.id == task_id) {
            return Err(BoardError::NotFound(format!("item {}", task_id)));
        }
        inner.running.push(task_id.to_string());
        Ok(())
    }
}
