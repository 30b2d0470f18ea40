//! board
//!
//! Task-board integration used by `care tasks`.
//!
//! # Modules
//!
//! - `traits`: the [`TaskBoard`] trait, [`Task`] and [`BoardError`]
//! - [`monday`]: Monday.com GraphQL client
//! - [`mock`]: in-memory board for tests

pub mod mock;
pub mod monday;
mod traits;

pub use monday::MondayBoard;
pub use traits::{BoardError, Person, Task, TaskBoard, DONE_STATE};
