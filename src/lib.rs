//! Sprint Timer Library
//!
//! A drift-resistant countdown for focused work sprints, plus the logic that
//! turns a completed countdown into a logged work session.
//! It includes:
//! - A clock abstraction with a manual clock for tests
//! - The countdown engine and its interchangeable tick drivers
//! - The session bridge and its confirmation workflow
//! - JSON-file persistence for sessions and task lists
//! - CLI command parsing and display utilities

pub mod cli;
pub mod clock;
pub mod session;
pub mod store;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use session::{
    ConfirmationStep, FocusRating, Rearm, SessionBridge, SessionError, SessionSink, TaskSource,
};
pub use store::{JsonSessionStore, JsonTaskList, MemorySessionSink, StoreError};
pub use timer::{
    Completion, CountdownEngine, InlineTickDriver, InlineTicker, ThreadTickDriver, Tick,
    TickDriver, TickOutcome, TimerError, TimerEvent, TokioTickDriver,
};
pub use types::{
    DriverKind, SessionRecord, SessionSnapshot, SprintConfig, TaskState, TimerConfig, TimerPhase,
    TimerState,
};
