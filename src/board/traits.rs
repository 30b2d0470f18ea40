//! board::traits
//!
//! Task-board trait and the task types shared by every implementation.
//!
//! # Design
//!
//! The trait is async because every board call is network I/O. The CLI
//! drives it from a runtime it builds per command; tests use
//! [`MockBoard`](super::mock::MockBoard) or a `wiremock` server.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// State value the board assigns to finished items.
pub const DONE_STATE: &str = "done";

/// Errors from task-board operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    /// No credential in config or environment.
    #[error("no board credential configured (set board.credential or $CARE_BOARD_TOKEN)")]
    MissingCredential,

    /// The credential was rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The board or item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The API answered with an error, either as an HTTP status or in the
    /// GraphQL `errors` array.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// No time-tracking column is configured.
    #[error("no time-tracking column configured (set board.time_column)")]
    TimeColumnNotConfigured,

    /// The item has no column with the configured id.
    #[error("item {task_id} has no column '{column}'")]
    MissingColumn {
        /// Item that was inspected
        task_id: String,
        /// Column id that was looked for
        column: String,
    },
}

/// Someone on the board, such as an item's creator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Person {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One board item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub creator: Option<Person>,
}

impl Task {
    /// Whether the board considers this item finished.
    pub fn is_done(&self) -> bool {
        self.state.as_deref() == Some(DONE_STATE)
    }
}

/// Ids arrive as strings from the API but as numbers from some fixtures.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// A remote task board.
#[async_trait]
pub trait TaskBoard: Send + Sync {
    /// Items on the board whose state is not `done`.
    async fn incomplete_tasks(&self, board_id: &str) -> Result<Vec<Task>, BoardError>;

    /// Items on the board created by `user_id`.
    async fn tasks_by_creator(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> Result<Vec<Task>, BoardError>;

    /// Start (or continue) the time tracker on one item.
    async fn start_timer(&self, board_id: &str, task_id: &str) -> Result<(), BoardError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_accept_numbers_and_strings() {
        let json = r#"[
            {"id": "101", "name": "a", "state": "active"},
            {"id": 102, "name": "b", "creator": {"id": 7, "name": "Ana"}}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks[0].id, "101");
        assert_eq!(tasks[1].id, "102");
        assert_eq!(tasks[1].creator.as_ref().unwrap().id, "7");
        assert!(tasks[1].state.is_none());
    }

    #[test]
    fn done_detection() {
        let task = Task {
            id: "1".into(),
            name: "x".into(),
            state: Some("done".into()),
            creator: None,
        };
        assert!(task.is_done());
        let task = Task {
            state: Some("active".into()),
            ..task
        };
        assert!(!task.is_done());
    }

    #[test]
    fn error_messages_name_the_setting() {
        assert!(BoardError::MissingCredential
            .to_string()
            .contains("CARE_BOARD_TOKEN"));
        assert!(BoardError::TimeColumnNotConfigured
            .to_string()
            .contains("board.time_column"));
    }
}
