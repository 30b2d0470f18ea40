//! board::monday
//!
//! Monday.com implementation of [`TaskBoard`] over the GraphQL API.
//!
//! Every call is a JSON `POST {query, variables}` to the configured base
//! URL with the credential in the `Authorization` header. Ids travel as
//! GraphQL variables, never spliced into the query text.
//!
//! # Errors
//!
//! - HTTP 401/403 become [`BoardError::AuthFailed`], 404 [`BoardError::NotFound`],
//!   429 [`BoardError::RateLimited`]; anything else non-2xx is [`BoardError::Api`].
//! - A 2xx body carrying an `errors` array or an `error_message` is also
//!   [`BoardError::Api`], with the first message.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::traits::{BoardError, Task, TaskBoard};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "care-cli";

/// Items requested per board page.
const ITEMS_PAGE_LIMIT: u32 = 500;

/// Value written to the time-tracking column to start it.
pub const TIMER_RUNNING_VALUE: &str = r#"{"running":true}"#;

const BOARD_ITEMS_QUERY: &str = r#"query ($board: [ID!], $limit: Int) {
  boards(ids: $board) {
    name
    items_page(limit: $limit) {
      items {
        id
        name
        state
        creator { id name }
      }
    }
  }
}"#;

const ITEM_COLUMNS_QUERY: &str = r#"query ($item: [ID!], $column: [String!]) {
  items(ids: $item) {
    id
    column_values(ids: $column) {
      id
      value
    }
  }
}"#;

const CHANGE_COLUMN_MUTATION: &str = r#"mutation ($board: ID!, $item: ID, $column: String!, $value: JSON!) {
  change_column_value(board_id: $board, item_id: $item, column_id: $column, value: $value) {
    id
  }
}"#;

/// Monday.com board client.
#[derive(Debug, Clone)]
pub struct MondayBoard {
    client: Client,
    base_url: String,
    token: String,
    time_column: Option<String>,
}

impl MondayBoard {
    /// Create a client for `base_url` authenticating with `token`.
    ///
    /// `time_column` is the id of the time-tracking column used by
    /// [`TaskBoard::start_timer`].
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        time_column: Option<String>,
    ) -> Result<Self, BoardError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(BoardError::MissingCredential);
        }
        Ok(Self {
            client: Client::new(),
            base_url: base_url.into(),
            token,
            time_column,
        })
    }

    fn headers(&self) -> Result<HeaderMap, BoardError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&self.token)
            .map_err(|_| BoardError::AuthFailed("credential is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Run one GraphQL document and return its `data`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, BoardError> {
        debug!(url = %self.base_url, %variables, "board request");
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&self.base_url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| BoardError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, BoardError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(response, status).await);
        }

        let envelope: GraphQLResponse<T> =
            response.json().await.map_err(|e| BoardError::Decode(e.to_string()))?;

        if let Some(message) = envelope.first_error() {
            return Err(BoardError::Api {
                status: status.as_u16(),
                message,
            });
        }

        envelope
            .data
            .ok_or_else(|| BoardError::Decode("response has no data".into()))
    }

    async fn handle_error_response(response: Response, status: StatusCode) -> BoardError {
        let message = match response.json::<GraphQLResponse<Value>>().await {
            Ok(body) => body
                .first_error()
                .unwrap_or_else(|| "Unknown error".to_string()),
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => BoardError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => BoardError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => BoardError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => BoardError::RateLimited,
            _ if status.is_server_error() => BoardError::Api {
                status: status.as_u16(),
                message: format!("board server error: {}", message),
            },
            _ => BoardError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    async fn board_items(&self, board_id: &str) -> Result<Vec<Task>, BoardError> {
        let data: BoardsData = self
            .graphql(
                BOARD_ITEMS_QUERY,
                json!({ "board": [board_id], "limit": ITEMS_PAGE_LIMIT }),
            )
            .await?;

        let board = data
            .boards
            .into_iter()
            .next()
            .ok_or_else(|| BoardError::NotFound(format!("board {}", board_id)))?;
        Ok(board.items_page.items)
    }
}

#[async_trait]
impl TaskBoard for MondayBoard {
    async fn incomplete_tasks(&self, board_id: &str) -> Result<Vec<Task>, BoardError> {
        let items = self.board_items(board_id).await?;
        Ok(items.into_iter().filter(|t| !t.is_done()).collect())
    }

    async fn tasks_by_creator(
        &self,
        board_id: &str,
        user_id: &str,
    ) -> Result<Vec<Task>, BoardError> {
        let items = self.board_items(board_id).await?;
        Ok(items
            .into_iter()
            .filter(|t| t.creator.as_ref().is_some_and(|c| c.id == user_id))
            .collect())
    }

    async fn start_timer(&self, board_id: &str, task_id: &str) -> Result<(), BoardError> {
        let column = self
            .time_column
            .as_deref()
            .ok_or(BoardError::TimeColumnNotConfigured)?;

        let data: ItemsData = self
            .graphql(
                ITEM_COLUMNS_QUERY,
                json!({ "item": [task_id], "column": [column] }),
            )
            .await?;

        let item = data
            .items
            .into_iter()
            .next()
            .ok_or_else(|| BoardError::NotFound(format!("item {}", task_id)))?;

        if !item.column_values.iter().any(|c| c.id == column) {
            return Err(BoardError::MissingColumn {
                task_id: task_id.to_string(),
                column: column.to_string(),
            });
        }

        let changed: ChangeData = self
            .graphql(
                CHANGE_COLUMN_MUTATION,
                json!({
                    "board": board_id,
                    "item": task_id,
                    "column": column,
                    "value": TIMER_RUNNING_VALUE,
                }),
            )
            .await?;

        match changed.change_column_value {
            Some(_) => {
                debug!(task_id, column, "timer started");
                Ok(())
            }
            None => Err(BoardError::Decode(format!(
                "timer change for item {} was not acknowledged",
                task_id
            ))),
        }
    }
}

/// GraphQL response envelope.
///
/// The API reports failures either as an `errors` array or as a top-level
/// `error_message`.
#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQLError>>,
    #[serde(default)]
    error_message: Option<String>,
}

impl<T> GraphQLResponse<T> {
    fn first_error(&self) -> Option<String> {
        if let Some(errors) = &self.errors {
            if let Some(first) = errors.first() {
                return Some(first.message.clone());
            }
        }
        self.error_message.clone()
    }
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
struct BoardsData {
    boards: Vec<BoardPage>,
}

#[derive(Deserialize)]
struct BoardPage {
    items_page: ItemsPage,
}

#[derive(Deserialize)]
struct ItemsPage {
    items: Vec<Task>,
}

#[derive(Deserialize)]
struct ItemsData {
    items: Vec<ItemColumns>,
}

#[derive(Deserialize)]
struct ItemColumns {
    column_values: Vec<ColumnValue>,
}

#[derive(Deserialize)]
struct ColumnValue {
    id: String,
}

#[derive(Deserialize)]
struct ChangeData {
    change_column_value: Option<Value>,
}
