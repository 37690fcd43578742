//! Local persistence collaborators.
//!
//! Plain last-write-wins wrappers: a JSON file of logged sessions, a JSON
//! task list read at snapshot time, and an in-memory sink for tests.

mod error;
mod json;
mod memory;

pub use error::StoreError;
pub use json::{JsonSessionStore, JsonTaskList};
pub use memory::MemorySessionSink;
