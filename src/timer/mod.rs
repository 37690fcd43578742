//! Countdown timer.
//!
//! The engine owns all timer state; tick drivers only tell it when to
//! recompute. Drivers run inline on the caller's loop, on a dedicated
//! thread, or on a tokio task, and the engine behaves identically in each
//! case because ticks always come back through its own queue.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sprint_timer::clock::ManualClock;
//! use sprint_timer::timer::CountdownEngine;
//! use sprint_timer::types::TimerConfig;
//!
//! let clock = ManualClock::new();
//! let config = TimerConfig::new(5).unwrap();
//! let (mut engine, ticker) = CountdownEngine::inline(config, clock.clone());
//!
//! engine.start().unwrap();
//! clock.advance(Duration::from_secs(5));
//! ticker.fire();
//!
//! let outcomes = engine.process_pending_ticks();
//! assert_eq!(outcomes[0].completion().unwrap().duration_seconds, 5);
//! ```

pub mod driver;
pub mod engine;
pub mod error;

pub use driver::{
    InlineTickDriver, InlineTicker, ThreadTickDriver, Tick, TickDriver, TickSender,
    TokioTickDriver, DEFAULT_TICK_INTERVAL,
};
pub use engine::{Completion, CountdownEngine, TickOutcome, TimerEvent};
pub use error::TimerError;
