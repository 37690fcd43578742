//! Work session logging.
//!
//! When a countdown completes, [`SessionBridge`] snapshots the caller's task
//! list and walks the user through a short confirmation:
//!
//! 1. Log this session? (yes / no)
//! 2. Optional focus rating, 1-5
//! 3. Optional improvement notes
//!
//! A confirmed session is handed to a [`SessionSink`]; afterwards the user
//! may attach a reflection to each task of the session.

pub mod bridge;
pub mod confirmation;
pub mod error;

pub use bridge::{LoggedSession, Rearm, SessionBridge, SessionSink, TaskSource};
pub use confirmation::{ConfirmationAnswers, ConfirmationFlow, ConfirmationStep, FocusRating};
pub use error::SessionError;
