//! Bridge from engine completion to a logged work session.
//!
//! The bridge captures the task list at the exact completion tick, drives
//! the confirmation workflow, hands the result to the persistence sink and
//! optionally collects per-task reflections afterwards. Every path that
//! ends a session (decline, cancel, reflections saved or skipped) re-arms the
//! engine so a stale completion can never fire again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::confirmation::{ConfirmationFlow, ConfirmationStep, FocusRating};
use super::error::SessionError;
use crate::clock::Clock;
use crate::timer::{Completion, CountdownEngine, TimerEvent};
use crate::types::{SessionRecord, SessionSnapshot, TaskState};

// ============================================================================
// Collaborators
// ============================================================================

/// Read-only view of the caller's task list.
pub trait TaskSource {
    /// Tasks in display order, as of now.
    fn current_tasks(&self) -> Vec<TaskState>;
}

impl<F> TaskSource for F
where
    F: Fn() -> Vec<TaskState>,
{
    fn current_tasks(&self) -> Vec<TaskState> {
        self()
    }
}

/// Persistence collaborator for logged sessions.
///
/// Failures are returned to the bridge's caller; the bridge never retries.
pub trait SessionSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record_session(&self, record: &SessionRecord) -> Result<(), Self::Error>;

    fn update_reflections(
        &self,
        session_id: Uuid,
        reflections: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error>;
}

/// Something that can begin a fresh countdown lifecycle.
pub trait Rearm {
    fn rearm(&mut self);
}

impl<C: Clock> Rearm for CountdownEngine<C> {
    fn rearm(&mut self) {
        self.reset();
    }
}

// ============================================================================
// LoggedSession
// ============================================================================

/// A session that was logged and is open for per-task reflections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedSession {
    id: Uuid,
    task_ids: Vec<String>,
    reflections: BTreeMap<String, String>,
}

impl LoggedSession {
    fn new(record: &SessionRecord) -> Self {
        Self {
            id: record.id,
            task_ids: record.tasks.iter().map(|t| t.id.clone()).collect(),
            reflections: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tasks that can receive a reflection, in snapshot order.
    pub fn task_ids(&self) -> &[String] {
        &self.task_ids
    }

    pub fn reflections(&self) -> &BTreeMap<String, String> {
        &self.reflections
    }
}

// ============================================================================
// SessionBridge
// ============================================================================

struct Pending {
    snapshot: SessionSnapshot,
    flow: ConfirmationFlow,
    started_at: DateTime<Utc>,
}

/// Turns engine completions into confirmed, persisted sessions.
pub struct SessionBridge<T, S> {
    tasks: T,
    sink: S,
    started_at: Option<DateTime<Utc>>,
    last_lifecycle: u64,
    pending: Option<Pending>,
    logged: Option<LoggedSession>,
}

impl<T: TaskSource, S: SessionSink> SessionBridge<T, S> {
    pub fn new(tasks: T, sink: S) -> Self {
        Self {
            tasks,
            sink,
            started_at: None,
            last_lifecycle: 0,
            pending: None,
            logged: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Engine observations ──────────────────────────────────────────

    /// Feeds one engine event. Returns the new snapshot on completion.
    pub fn observe(&mut self, event: &TimerEvent) -> Option<&SessionSnapshot> {
        match event {
            TimerEvent::Started { .. } => {
                self.mark_started(Utc::now());
                None
            }
            TimerEvent::Configured { .. } | TimerEvent::Reset { .. } => {
                self.started_at = None;
                None
            }
            TimerEvent::Completed(completion) => self.on_completion(*completion),
            _ => None,
        }
    }

    /// Records when the current lifecycle was first started.
    ///
    /// Later calls within the same lifecycle keep the first value.
    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        self.started_at.get_or_insert(at);
    }

    /// Captures the task snapshot and opens the confirmation prompt.
    ///
    /// Call this with the outcome of the tick that completed, so the snapshot
    /// reflects the task list at that instant. A completion from a lifecycle
    /// already handled is ignored.
    pub fn on_completion(&mut self, completion: Completion) -> Option<&SessionSnapshot> {
        if completion.lifecycle <= self.last_lifecycle {
            tracing::debug!(
                lifecycle = completion.lifecycle,
                last = self.last_lifecycle,
                "stale completion ignored"
            );
            return None;
        }

        let snapshot = SessionSnapshot::capture(
            completion.duration_seconds,
            self.tasks.current_tasks(),
            completion.lifecycle,
        );
        let started_at = self.started_at.take().unwrap_or_else(|| {
            Utc::now() - chrono::Duration::seconds(i64::from(completion.duration_seconds))
        });

        if self.pending.is_some() {
            tracing::info!("未確定のセッションを新しい完了で置き換えます");
        }
        if self.logged.take().is_some() {
            tracing::warn!("保存されていない振り返りを破棄しました");
        }

        tracing::info!(
            duration_seconds = snapshot.duration_seconds(),
            completed_tasks = snapshot.completed_count(),
            "セッションのスナップショットを取得しました"
        );
        self.last_lifecycle = completion.lifecycle;
        self.pending = Some(Pending {
            snapshot,
            flow: ConfirmationFlow::new(),
            started_at,
        });
        self.pending.as_ref().map(|p| &p.snapshot)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn step(&self) -> Option<ConfirmationStep> {
        self.pending.as_ref().map(|p| p.flow.step())
    }

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.pending.as_ref().map(|p| &p.snapshot)
    }

    pub fn flow(&self) -> Option<&ConfirmationFlow> {
        self.pending.as_ref().map(|p| &p.flow)
    }

    pub fn logged_session(&self) -> Option<&LoggedSession> {
        self.logged.as_ref()
    }

    // ── Confirmation ─────────────────────────────────────────────────

    /// "Yes, log it."
    pub fn accept(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.flow_mut()?.accept()
    }

    /// "No": discards the snapshot and starts a fresh lifecycle.
    pub fn decline(&mut self, engine: &mut impl Rearm) -> Result<(), SessionError> {
        let step = self.flow_mut()?.step();
        if step != ConfirmationStep::Prompt {
            return Err(SessionError::InvalidStep {
                expected: ConfirmationStep::Prompt,
                actual: step,
            });
        }
        self.discard(engine);
        Ok(())
    }

    pub fn rate(&mut self, value: u8) -> Result<FocusRating, SessionError> {
        self.flow_mut()?.rate(value)
    }

    pub fn skip_rating(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.flow_mut()?.skip_rating()
    }

    pub fn continue_to_notes(&mut self) -> Result<ConfirmationStep, SessionError> {
        self.flow_mut()?.continue_to_notes()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        self.flow_mut()?.set_notes(notes)
    }

    pub fn back(&mut self) -> Result<ConfirmationStep, SessionError> {
        Ok(self.flow_mut()?.back())
    }

    /// Abandons the confirmation at any step.
    pub fn cancel(&mut self, engine: &mut impl Rearm) -> Result<(), SessionError> {
        if self.pending.is_none() {
            return Err(SessionError::NoPendingSession);
        }
        self.discard(engine);
        Ok(())
    }

    /// Logs the session.
    ///
    /// The confirmation state is torn down only after the sink accepts the
    /// record; on failure it stays at the notes step so the caller can retry
    /// or cancel.
    pub fn submit(&mut self) -> Result<SessionRecord, SessionError> {
        let pending = self.pending.as_ref().ok_or(SessionError::NoPendingSession)?;
        let answers = pending.flow.answers()?;
        let snapshot = &pending.snapshot;

        let record = SessionRecord {
            id: Uuid::new_v4(),
            started_at: pending.started_at,
            duration_seconds: snapshot.duration_seconds(),
            completed_task_ids: snapshot.completed_task_ids(),
            tasks: snapshot.tasks().to_vec(),
            focus_rating: answers.rating.map(FocusRating::get),
            improvement_notes: answers.notes,
            task_reflections: BTreeMap::new(),
        };

        if let Err(e) = self.sink.record_session(&record) {
            tracing::warn!(error = %e, "セッションの保存に失敗しました");
            return Err(SessionError::Sink(Box::new(e)));
        }

        self.pending = None;
        tracing::info!(session_id = %record.id, "セッションを記録しました");
        self.logged = Some(LoggedSession::new(&record));
        Ok(record)
    }

    // ── Reflections ──────────────────────────────────────────────────

    /// Sets the reflection text for one task of the logged session.
    pub fn reflect(
        &mut self,
        task_id: &str,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let logged = self.logged.as_mut().ok_or(SessionError::NoLoggedSession)?;
        if !logged.task_ids.iter().any(|id| id == task_id) {
            return Err(SessionError::UnknownTask(task_id.to_string()));
        }
        logged.reflections.insert(task_id.to_string(), text.into());
        Ok(())
    }

    /// Persists non-blank reflections and starts a fresh lifecycle.
    pub fn save_reflections(&mut self, engine: &mut impl Rearm) -> Result<(), SessionError> {
        let logged = self.logged.as_ref().ok_or(SessionError::NoLoggedSession)?;

        let reflections: BTreeMap<String, String> = logged
            .reflections
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(id, text)| (id.clone(), text.trim().to_string()))
            .collect();

        if !reflections.is_empty() {
            self.sink
                .update_reflections(logged.id, &reflections)
                .map_err(|e| {
                    tracing::warn!(error = %e, "振り返りの保存に失敗しました");
                    SessionError::Sink(Box::new(e))
                })?;
            tracing::info!(count = reflections.len(), "振り返りを保存しました");
        }

        self.logged = None;
        engine.rearm();
        Ok(())
    }

    /// Closes the reflections stage without saving and starts a fresh lifecycle.
    pub fn skip_reflections(&mut self, engine: &mut impl Rearm) -> Result<(), SessionError> {
        self.logged.take().ok_or(SessionError::NoLoggedSession)?;
        engine.rearm();
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn flow_mut(&mut self) -> Result<&mut ConfirmationFlow, SessionError> {
        self.pending
            .as_mut()
            .map(|p| &mut p.flow)
            .ok_or(SessionError::NoPendingSession)
    }

    fn discard(&mut self, engine: &mut impl Rearm) {
        self.pending = None;
        tracing::info!("セッションを破棄しました");
        engine.rearm();
    }
}

// ============================================================================
// Tests
// ============================================================================
