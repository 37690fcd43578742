//! Core data types for the sprint timer.
//!
//! This module defines the data structures used for:
//! - Countdown configuration with validation
//! - Timer state snapshots and presentation helpers
//! - Task and session records exchanged with collaborators
//! - Application configuration

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerError;

/// Longest countdown accepted through the minutes-based APIs.
pub const MAX_MINUTES: u32 = 240;

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of a countdown lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Configured but never started in this lifecycle
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Stopped mid-flight with elapsed time frozen
    Paused,
    /// Reached zero; terminal until reset or reconfiguration
    Completed,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        }
    }

    /// Returns true if the countdown is actively running.
    pub fn is_active(&self) -> bool {
        matches!(self, TimerPhase::Running)
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Immutable configuration of one countdown.
///
/// Deserialization goes through [`TimerConfig::new`], so a zero duration is
/// rejected there as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimerConfig")]
pub struct TimerConfig {
    duration_seconds: u32,
}

#[derive(Deserialize)]
struct RawTimerConfig {
    duration_seconds: u32,
}

impl TryFrom<RawTimerConfig> for TimerConfig {
    type Error = TimerError;

    fn try_from(raw: RawTimerConfig) -> Result<Self, Self::Error> {
        Self::new(raw.duration_seconds)
    }
}

impl TimerConfig {
    /// Creates a configuration for the given number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] if the duration is zero.
    pub fn new(duration_seconds: u32) -> Result<Self, TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::InvalidConfiguration {
                duration_seconds: 0,
            });
        }
        Ok(Self { duration_seconds })
    }

    /// Creates a configuration from whole minutes (1-240).
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::DurationOutOfRange`] outside the accepted range.
    pub fn from_minutes(minutes: u32) -> Result<Self, TimerError> {
        if minutes == 0 || minutes > MAX_MINUTES {
            return Err(TimerError::DurationOutOfRange { minutes });
        }
        Self::new(minutes * 60)
    }

    /// Returns the configured duration in whole seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Returns the configured duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_seconds))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 25 * 60,
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Point-in-time view of a countdown engine.
///
/// Remaining and elapsed values keep their fractional part; flooring happens
/// only in the presentation helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current phase
    pub phase: TimerPhase,
    /// Configured duration in seconds
    pub duration_seconds: u32,
    /// Remaining seconds as of the last recomputation
    pub remaining_seconds: f64,
    /// Elapsed running time frozen at the last pause
    pub paused_elapsed_seconds: f64,
    /// Lifecycle counter; bumped by configure and reset
    pub lifecycle: u64,
}

impl TimerState {
    /// Returns true if the countdown is running.
    pub fn is_running(&self) -> bool {
        self.phase.is_active()
    }

    /// Remaining time floored to whole seconds for display.
    pub fn remaining_whole_seconds(&self) -> u32 {
        self.remaining_seconds.max(0.0).floor() as u32
    }

    /// Fraction of the countdown already consumed, 0.0 ..= 1.0.
    pub fn progress(&self) -> f64 {
        progress(self.duration_seconds, self.remaining_seconds)
    }
}

/// Fraction of `duration_seconds` consumed given `remaining_seconds`.
pub fn progress(duration_seconds: u32, remaining_seconds: f64) -> f64 {
    if duration_seconds == 0 {
        return 0.0;
    }
    (1.0 - remaining_seconds / f64::from(duration_seconds)).clamp(0.0, 1.0)
}

/// Formats seconds as `m:ss`, flooring fractional seconds.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

// ============================================================================
// Tasks and sessions
// ============================================================================

/// A task as reported by the task source at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    /// Stable task identifier
    pub id: String,
    /// Task text
    #[serde(default)]
    pub text: String,
    /// Whether the task was checked off
    pub completed: bool,
}

impl TaskState {
    /// Creates a task state.
    pub fn new(id: impl Into<String>, text: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed,
        }
    }
}

/// Task completion state captured at the tick that crossed zero.
///
/// Immutable once created; only the confirmation workflow holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    duration_seconds: u32,
    captured_task_states: Vec<TaskState>,
    lifecycle: u64,
}

impl SessionSnapshot {
    /// Captures a snapshot for a completed lifecycle.
    pub fn capture(duration_seconds: u32, tasks: Vec<TaskState>, lifecycle: u64) -> Self {
        Self {
            duration_seconds,
            captured_task_states: tasks,
            lifecycle,
        }
    }

    /// The canonical completed duration in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Tasks in the order the task source reported them.
    pub fn tasks(&self) -> &[TaskState] {
        &self.captured_task_states
    }

    /// Lifecycle of the countdown that produced this snapshot.
    pub fn lifecycle(&self) -> u64 {
        self.lifecycle
    }

    /// Identifiers of tasks that were completed, in order.
    pub fn completed_task_ids(&self) -> Vec<String> {
        self.captured_task_states
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Number of completed tasks.
    pub fn completed_count(&self) -> usize {
        self.captured_task_states.iter().filter(|t| t.completed).count()
    }

    /// Duration in whole minutes, as shown in the log prompt.
    pub fn whole_minutes(&self) -> u32 {
        self.duration_seconds / 60
    }
}

/// A logged work session handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session identifier
    pub id: Uuid,
    /// Wall-clock time the countdown was first started
    pub started_at: DateTime<Utc>,
    /// Canonical completed duration
    pub duration_seconds: u32,
    /// Tasks completed at the completion tick
    pub completed_task_ids: Vec<String>,
    /// Full task list captured at the completion tick
    #[serde(default)]
    pub tasks: Vec<TaskState>,
    /// Optional focus rating (1-5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_rating: Option<u8>,
    /// Optional improvement notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_notes: Option<String>,
    /// Per-task reflections written after logging
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub task_reflections: BTreeMap<String, String>,
}

// ============================================================================
// SprintConfig
// ============================================================================

/// Which execution context produces ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Dedicated OS thread
    #[default]
    Thread,
    /// Task on the ambient tokio runtime
    Tokio,
    /// Pumped by the caller's own loop
    Inline,
}

fn default_minutes() -> u32 {
    25
}

fn default_tick_interval_ms() -> u64 {
    100
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintConfig {
    /// Countdown length used when none is given on the command line.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,

    /// Nominal tick cadence in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Tick execution context.
    #[serde(default)]
    pub driver: DriverKind,

    /// Session store location; the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<std::path::PathBuf>,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
            driver: DriverKind::default(),
            store_path: None,
        }
    }
}

impl SprintConfig {
    /// Sets the default countdown length.
    pub fn with_default_minutes(mut self, minutes: u32) -> Self {
        self.default_minutes = minutes;
        self
    }

    /// Sets the driver kind.
    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    /// Returns the tick cadence.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_minutes < 1 || self.default_minutes > MAX_MINUTES {
            return Err(format!(
                "タイマー時間は1-{}分の範囲で指定してください",
                MAX_MINUTES
            ));
        }
        if self.tick_interval_ms < 10 || self.tick_interval_ms > 1000 {
            return Err("ティック間隔は10-1000ミリ秒の範囲で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
