//! Tick drivers.
//!
//! A driver only signals "time to recompute"; it never measures elapsed
//! time. Every tick carries the generation it was started under and is
//! delivered over the engine's single-consumer queue, so the engine can
//! discard anything issued before its latest transition.
//!
//! Three execution contexts are provided:
//! - [`InlineTickDriver`]: the caller's own loop fires ticks through an
//!   [`InlineTicker`] handle
//! - [`ThreadTickDriver`]: a dedicated OS thread driven by a crossbeam ticker
//! - [`TokioTickDriver`]: a task on a tokio runtime using `interval`

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Sender};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, MissedTickBehavior};

use super::error::TimerError;

/// Nominal tick cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// A request to recompute remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Engine generation the issuing driver was started under
    pub generation: u64,
}

/// Producer half of the engine's tick queue.
pub type TickSender = mpsc::UnboundedSender<Tick>;

/// Periodic tick source.
pub trait TickDriver: Send {
    /// Begins periodic delivery of ticks tagged with `generation`.
    ///
    /// No-op if already started.
    ///
    /// # Errors
    ///
    /// Returns an error if the execution context cannot be set up.
    fn start(&mut self, generation: u64, sender: TickSender) -> Result<(), TimerError>;

    /// Halts delivery. Once this returns the driver sends nothing more.
    ///
    /// Idempotent and safe to call from teardown paths.
    fn stop(&mut self);

    /// Returns true between `start` and `stop`.
    fn is_started(&self) -> bool;
}

// ============================================================================
// InlineTickDriver
// ============================================================================

#[derive(Debug)]
struct Armed {
    generation: u64,
    sender: TickSender,
}

type Slot = Arc<Mutex<Option<Armed>>>;

fn lock(slot: &Slot) -> std::sync::MutexGuard<'_, Option<Armed>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Driver whose ticks are produced by the caller.
///
/// `start` arms the paired [`InlineTicker`]; `stop` disarms it under the same
/// lock, so a `fire` racing with `stop` either lands before it or not at all.
#[derive(Debug)]
pub struct InlineTickDriver {
    slot: Slot,
}

/// Handle used by the caller's loop to fire ticks into an [`InlineTickDriver`].
#[derive(Debug, Clone)]
pub struct InlineTicker {
    slot: Slot,
}

impl InlineTickDriver {
    #[must_use]
    pub fn new() -> (Self, InlineTicker) {
        let slot: Slot = Arc::new(Mutex::new(None));
        (
            Self { slot: slot.clone() },
            InlineTicker { slot },
        )
    }
}

impl TickDriver for InlineTickDriver {
    fn start(&mut self, generation: u64, sender: TickSender) -> Result<(), TimerError> {
        let mut slot = lock(&self.slot);
        if slot.is_none() {
            *slot = Some(Armed { generation, sender });
        }
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.slot).take();
    }

    fn is_started(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

impl InlineTicker {
    /// Queues one tick. Returns false if the driver is stopped.
    pub fn fire(&self) -> bool {
        match lock(&self.slot).as_ref() {
            Some(armed) => armed
                .sender
                .send(Tick {
                    generation: armed.generation,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Returns true if ticks fired now would be queued.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

// ============================================================================
// ThreadTickDriver
// ============================================================================

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Driver that ticks from a dedicated OS thread.
///
/// `stop` signals the thread and joins it, which is the synchronization
/// point: no tick is sent after `stop` returns.
pub struct ThreadTickDriver {
    interval: Duration,
    worker: Option<Worker>,
}

impl ThreadTickDriver {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            worker: None,
        }
    }

    /// Returns the tick cadence.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for ThreadTickDriver {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl fmt::Debug for ThreadTickDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTickDriver")
            .field("interval", &self.interval)
            .field("started", &self.worker.is_some())
            .finish()
    }
}

impl TickDriver for ThreadTickDriver {
    fn start(&mut self, generation: u64, sender: TickSender) -> Result<(), TimerError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let period = self.interval;

        let handle = thread::Builder::new()
            .name("sprint-tick".to_string())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(period);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if sender.send(Tick { generation }).is_err() {
                                break;
                            }
                        }
                    }
                }
            })
            .map_err(|e| TimerError::DriverSpawnFailed(e.to_string()))?;

        tracing::debug!(generation, "ティックスレッドを起動しました");
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                tracing::warn!("ティックスレッドが異常終了しました");
            }
        }
    }

    fn is_started(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for ThreadTickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// TokioTickDriver
// ============================================================================

/// Driver that ticks from a task on a tokio runtime.
///
/// The task is cancelled on `stop`, but a tick it already queued can still
/// be in flight; the engine's generation check discards it.
pub struct TokioTickDriver {
    runtime: tokio::runtime::Handle,
    interval: Duration,
    task: Option<(oneshot::Sender<()>, tokio::task::JoinHandle<()>)>,
}

impl TokioTickDriver {
    /// Creates a driver bound to the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::DriverUnavailable`] outside a tokio runtime.
    pub fn new(interval: Duration) -> Result<Self, TimerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TimerError::DriverUnavailable(e.to_string()))?;
        Ok(Self::with_handle(runtime, interval))
    }

    /// Creates a driver bound to the given runtime.
    #[must_use]
    pub fn with_handle(runtime: tokio::runtime::Handle, interval: Duration) -> Self {
        Self {
            runtime,
            interval,
            task: None,
        }
    }
}

impl fmt::Debug for TokioTickDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioTickDriver")
            .field("interval", &self.interval)
            .field("started", &self.task.is_some())
            .finish()
    }
}

impl TickDriver for TokioTickDriver {
    fn start(&mut self, generation: u64, sender: TickSender) -> Result<(), TimerError> {
        if self.task.is_some() {
            return Ok(());
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.interval;

        let handle = self.runtime.spawn(async move {
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if sender.send(Tick { generation }).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!(generation, "ティックタスクを起動しました");
        self.task = Some((stop_tx, handle));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some((stop_tx, handle)) = self.task.take() {
            let _ = stop_tx.send(());
            handle.abort();
        }
    }

    fn is_started(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TokioTickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
