//! Countdown engine.
//!
//! This module provides the core timing functionality:
//! - Drift-resistant countdown recomputed from a monotonic clock on every tick
//! - Pause/resume without losing or double-counting elapsed time
//! - At-most-once completion per lifecycle
//! - Event broadcast for remaining-time and completion observers
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Completed
//!   ^__________________ reset / configure ____________|
//! ```
//!
//! Elapsed time is tracked explicitly: finished running segments are banked
//! in `paused_elapsed` and the open segment is measured from
//! `segment_started_at`. Ticks are tagged with the generation current when
//! their driver was started; every start, pause, reset, configure and
//! completion bumps the generation, so a tick issued before any of those is
//! discarded.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::driver::{
    InlineTickDriver, InlineTicker, ThreadTickDriver, Tick, TickDriver, TickSender,
};
use super::error::TimerError;
use crate::clock::{Clock, MonotonicClock};
use crate::types::{TimerConfig, TimerPhase, TimerState};

// ============================================================================
// Events
// ============================================================================

/// The one-shot completion signal of a lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Configured duration; never the overshot elapsed value
    pub duration_seconds: u32,
    /// Lifecycle that completed
    pub lifecycle: u64,
}

/// Observations published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// A new configuration began a new lifecycle
    Configured {
        /// Configured duration
        duration_seconds: u32,
        /// New lifecycle
        lifecycle: u64,
    },
    /// First start of a lifecycle
    Started {
        /// Remaining seconds at start
        remaining_seconds: f64,
    },
    /// Start after a pause
    Resumed {
        /// Remaining seconds at resume
        remaining_seconds: f64,
    },
    /// Countdown paused
    Paused {
        /// Remaining seconds retained across the pause
        remaining_seconds: f64,
    },
    /// Countdown reset to its full duration
    Reset {
        /// Configured duration
        duration_seconds: u32,
        /// New lifecycle
        lifecycle: u64,
    },
    /// Remaining time recomputed on a tick
    RemainingChanged {
        /// Remaining seconds, never negative
        remaining_seconds: f64,
    },
    /// Countdown reached zero
    Completed(Completion),
}

/// Result of applying one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Tick was issued under an older generation or while not running
    Stale,
    /// Remaining time recomputed
    Updated {
        /// Remaining seconds after the tick
        remaining_seconds: f64,
    },
    /// This tick crossed zero
    Completed(Completion),
}

impl TickOutcome {
    /// Returns the completion if this tick produced one.
    pub fn completion(&self) -> Option<Completion> {
        match self {
            TickOutcome::Completed(c) => Some(*c),
            _ => None,
        }
    }
}

// ============================================================================
// CountdownEngine
// ============================================================================

/// Pausable, drift-resistant countdown.
///
/// The engine is the sole owner of its timer state. Drivers push ticks into
/// a single-consumer queue; the owner applies them with
/// [`process_pending_ticks`](Self::process_pending_ticks),
/// [`next_tick`](Self::next_tick) or [`next_tick_blocking`](Self::next_tick_blocking).
pub struct CountdownEngine<C: Clock = MonotonicClock> {
    clock: C,
    config: TimerConfig,
    phase: TimerPhase,
    remaining_seconds: f64,
    paused_elapsed: Duration,
    segment_started_at: Option<Instant>,
    completion_fired: bool,
    generation: u64,
    lifecycle: u64,
    driver: Box<dyn TickDriver>,
    tick_tx: TickSender,
    tick_rx: mpsc::UnboundedReceiver<Tick>,
    subscribers: Vec<mpsc::UnboundedSender<TimerEvent>>,
}

impl CountdownEngine<MonotonicClock> {
    /// Creates an engine on the system clock ticking from a dedicated thread.
    pub fn threaded(config: TimerConfig, interval: Duration) -> Self {
        Self::new(config, MonotonicClock, ThreadTickDriver::new(interval))
    }
}

impl<C: Clock> CountdownEngine<C> {
    /// Creates an idle engine.
    pub fn new(config: TimerConfig, clock: C, driver: impl TickDriver + 'static) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            clock,
            config,
            phase: TimerPhase::Idle,
            remaining_seconds: f64::from(config.duration_seconds()),
            paused_elapsed: Duration::ZERO,
            segment_started_at: None,
            completion_fired: false,
            generation: 0,
            lifecycle: 1,
            driver: Box::new(driver),
            tick_tx,
            tick_rx,
            subscribers: Vec::new(),
        }
    }

    /// Creates an engine whose ticks are fired by the caller.
    pub fn inline(config: TimerConfig, clock: C) -> (Self, InlineTicker) {
        let (driver, ticker) = InlineTickDriver::new();
        (Self::new(config, clock, driver), ticker)
    }

    /// Registers an observer for all subsequent events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<TimerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Sets a new duration and begins a new lifecycle.
    ///
    /// A running countdown is stopped first.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] for a zero duration; the
    /// engine is left untouched.
    pub fn configure(&mut self, duration_seconds: u32) -> Result<(), TimerError> {
        let config = TimerConfig::new(duration_seconds)?;
        self.halt();
        self.config = config;
        self.rearm_lifecycle();

        tracing::info!(
            duration_seconds,
            lifecycle = self.lifecycle,
            "タイマーを設定しました"
        );
        self.emit(TimerEvent::Configured {
            duration_seconds,
            lifecycle: self.lifecycle,
        });
        Ok(())
    }

    /// Starts or resumes the countdown.
    ///
    /// No-op if already running or if nothing remains.
    ///
    /// # Errors
    ///
    /// Returns an error if the tick driver fails to start; the engine stays
    /// stopped.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.phase.is_active() || self.remaining_seconds <= 0.0 {
            tracing::debug!(phase = self.phase.as_str(), "start ignored");
            return Ok(());
        }

        let resuming = self.phase == TimerPhase::Paused;
        let generation = self.generation + 1;
        self.driver.start(generation, self.tick_tx.clone())?;

        self.generation = generation;
        self.segment_started_at = Some(self.clock.now());
        self.phase = TimerPhase::Running;

        let remaining_seconds = self.remaining_seconds;
        if resuming {
            tracing::info!(remaining_seconds, "タイマーを再開しました");
            self.emit(TimerEvent::Resumed { remaining_seconds });
        } else {
            tracing::info!(remaining_seconds, "タイマーを開始しました");
            self.emit(TimerEvent::Started { remaining_seconds });
        }
        Ok(())
    }

    /// Pauses the countdown, freezing elapsed time.
    ///
    /// No-op if not running. Remaining time keeps its last computed value.
    pub fn pause(&mut self) {
        if !self.phase.is_active() {
            tracing::debug!(phase = self.phase.as_str(), "pause ignored");
            return;
        }

        self.paused_elapsed = self.elapsed();
        self.halt();
        self.phase = TimerPhase::Paused;

        let remaining_seconds = self.remaining_seconds;
        tracing::info!(
            remaining_seconds,
            paused_elapsed = self.paused_elapsed.as_secs_f64(),
            "タイマーを一時停止しました"
        );
        self.emit(TimerEvent::Paused { remaining_seconds });
    }

    /// Returns to the full duration and begins a new lifecycle.
    ///
    /// Valid from any state.
    pub fn reset(&mut self) {
        self.halt();
        self.rearm_lifecycle();

        tracing::info!(lifecycle = self.lifecycle, "タイマーをリセットしました");
        self.emit(TimerEvent::Reset {
            duration_seconds: self.config.duration_seconds(),
            lifecycle: self.lifecycle,
        });
    }

    // ── Tick handling ────────────────────────────────────────────────

    /// Applies one tick.
    ///
    /// Ticks from an older generation, or arriving while not running, are
    /// discarded without any observable effect.
    pub fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if tick.generation != self.generation || !self.phase.is_active() {
            tracing::debug!(
                tick_generation = tick.generation,
                generation = self.generation,
                "stale tick discarded"
            );
            return TickOutcome::Stale;
        }

        let elapsed = self.elapsed();
        let duration = f64::from(self.config.duration_seconds());
        let remaining_seconds = (duration - elapsed.as_secs_f64()).max(0.0);
        self.remaining_seconds = remaining_seconds;
        self.emit(TimerEvent::RemainingChanged { remaining_seconds });

        if remaining_seconds <= 0.0 && !self.completion_fired {
            self.completion_fired = true;
            self.paused_elapsed = elapsed;
            self.halt();
            self.phase = TimerPhase::Completed;

            let completion = Completion {
                duration_seconds: self.config.duration_seconds(),
                lifecycle: self.lifecycle,
            };
            tracing::info!(
                duration_seconds = completion.duration_seconds,
                lifecycle = completion.lifecycle,
                "タイマーが完了しました"
            );
            self.emit(TimerEvent::Completed(completion));
            return TickOutcome::Completed(completion);
        }

        TickOutcome::Updated { remaining_seconds }
    }

    /// Applies every tick already queued, without waiting.
    pub fn process_pending_ticks(&mut self) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(tick) = self.tick_rx.try_recv() {
            outcomes.push(self.on_tick(tick));
        }
        outcomes
    }

    /// Waits for the next queued tick and applies it.
    ///
    /// Cancel-safe: dropping the future before it resolves loses no tick.
    pub async fn next_tick(&mut self) -> TickOutcome {
        match self.tick_rx.recv().await {
            Some(tick) => self.on_tick(tick),
            None => TickOutcome::Stale,
        }
    }

    /// Blocking variant of [`next_tick`](Self::next_tick) for plain threads.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn next_tick_blocking(&mut self) -> TickOutcome {
        match self.tick_rx.blocking_recv() {
            Some(tick) => self.on_tick(tick),
            None => TickOutcome::Stale,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Returns a snapshot of the timer state.
    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            duration_seconds: self.config.duration_seconds(),
            remaining_seconds: self.remaining_seconds,
            paused_elapsed_seconds: self.paused_elapsed.as_secs_f64(),
            lifecycle: self.lifecycle,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_active()
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.remaining_seconds
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn lifecycle(&self) -> u64 {
        self.lifecycle
    }

    /// Current tick generation; ticks tagged otherwise are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total running time in this lifecycle, excluding paused gaps.
    pub fn elapsed(&self) -> Duration {
        match self.segment_started_at {
            Some(started) => {
                self.paused_elapsed + self.clock.now().saturating_duration_since(started)
            }
            None => self.paused_elapsed,
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Stops the driver and invalidates every tick issued so far.
    fn halt(&mut self) {
        self.driver.stop();
        self.generation += 1;
        self.segment_started_at = None;
    }

    fn rearm_lifecycle(&mut self) {
        self.lifecycle += 1;
        self.phase = TimerPhase::Idle;
        self.remaining_seconds = f64::from(self.config.duration_seconds());
        self.paused_elapsed = Duration::ZERO;
        self.completion_fired = false;
    }

    fn emit(&mut self, event: TimerEvent) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if self.subscribers.len() < before {
            tracing::debug!(
                dropped = before - self.subscribers.len(),
                "closed subscribers pruned"
            );
        }
    }
}

impl<C: Clock> Drop for CountdownEngine<C> {
    fn drop(&mut self) {
        self.driver.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
