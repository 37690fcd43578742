//! End-to-end session logging: engine completion through the bridge into a
//! sink, with the task list changing around the completion tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sprint_timer::clock::ManualClock;
use sprint_timer::session::{ConfirmationStep, SessionBridge, SessionError};
use sprint_timer::store::{JsonSessionStore, MemorySessionSink};
use sprint_timer::timer::{CountdownEngine, InlineTicker, TimerEvent};
use sprint_timer::types::{TaskState, TimerConfig, TimerPhase};

// ============================================================================
// Test Helpers
// ============================================================================

type SharedTasks = Arc<Mutex<Vec<TaskState>>>;

fn shared_tasks(tasks: Vec<TaskState>) -> SharedTasks {
    Arc::new(Mutex::new(tasks))
}

fn task_source(tasks: &SharedTasks) -> impl Fn() -> Vec<TaskState> {
    let tasks = tasks.clone();
    move || tasks.lock().unwrap().clone()
}

fn engine(duration_seconds: u32) -> (CountdownEngine<ManualClock>, InlineTicker, ManualClock) {
    let clock = ManualClock::new();
    let config = TimerConfig::new(duration_seconds).unwrap();
    let (engine, ticker) = CountdownEngine::inline(config, clock.clone());
    (engine, ticker, clock)
}

/// Runs the engine to completion, feeding every event to the bridge.
fn run_to_completion<T, S>(
    engine: &mut CountdownEngine<ManualClock>,
    ticker: &InlineTicker,
    clock: &ManualClock,
    bridge: &mut SessionBridge<T, S>,
) where
    T: sprint_timer::session::TaskSource,
    S: sprint_timer::session::SessionSink,
{
    let mut events = engine.subscribe();
    engine.start().unwrap();
    clock.advance(Duration::from_secs(u64::from(
        engine.config().duration_seconds(),
    )));
    ticker.fire();
    engine.process_pending_ticks();

    while let Ok(event) = events.try_recv() {
        bridge.observe(&event);
    }
}

// ============================================================================
// Flow Tests
// ============================================================================

mod logging {
    use super::*;

    #[test]
    fn test_full_flow_with_rating_notes_and_reflections() {
        let tasks = shared_tasks(vec![
            TaskState::new("1", "write report", true),
            TaskState::new("2", "review PR", false),
            TaskState::new("3", "reply to mail", true),
        ]);
        let (mut engine, ticker, clock) = engine(1500);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());

        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        // Edits after the completion tick do not leak into the snapshot.
        tasks.lock().unwrap()[1].completed = true;

        assert_eq!(bridge.step(), Some(ConfirmationStep::Prompt));
        let snapshot = bridge.snapshot().unwrap();
        assert_eq!(snapshot.whole_minutes(), 25);
        assert_eq!(snapshot.completed_task_ids(), vec!["1", "3"]);

        bridge.accept().unwrap();
        bridge.rate(4).unwrap();
        bridge.continue_to_notes().unwrap();
        bridge.set_notes("  fewer context switches  ").unwrap();
        let record = bridge.submit().unwrap();

        assert_eq!(record.duration_seconds, 1500);
        assert_eq!(record.completed_task_ids, vec!["1", "3"]);
        assert_eq!(record.tasks.len(), 3);
        assert_eq!(record.focus_rating, Some(4));
        assert_eq!(
            record.improvement_notes.as_deref(),
            Some("fewer context switches")
        );
        assert!(!bridge.is_pending());

        bridge.reflect("1", "went well").unwrap();
        bridge.reflect("2", "   ").unwrap();
        bridge.save_reflections(&mut engine).unwrap();

        let stored = bridge.sink().sessions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, record.id);
        assert_eq!(stored[0].task_reflections.len(), 1);
        assert_eq!(stored[0].task_reflections["1"], "went well");

        // Saving reflections starts a fresh countdown lifecycle.
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.remaining_seconds(), 1500.0);
    }

    #[test]
    fn test_skip_everything_logs_bare_session() {
        let tasks = shared_tasks(Vec::new());
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());

        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        bridge.skip_rating().unwrap();
        let record = bridge.submit().unwrap();

        assert_eq!(record.focus_rating, None);
        assert_eq!(record.improvement_notes, None);
        assert!(record.completed_task_ids.is_empty());

        bridge.skip_reflections(&mut engine).unwrap();
        assert_eq!(bridge.sink().record_count(), 1);
        assert_eq!(engine.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_back_keeps_answers() {
        let tasks = shared_tasks(Vec::new());
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        bridge.rate(2).unwrap();
        bridge.continue_to_notes().unwrap();
        assert_eq!(bridge.back().unwrap(), ConfirmationStep::Rating);
        bridge.rate(5).unwrap();
        bridge.continue_to_notes().unwrap();

        let record = bridge.submit().unwrap();
        assert_eq!(record.focus_rating, Some(5));
    }
}

mod discarding {
    use super::*;

    #[test]
    fn test_decline_logs_nothing_and_rearms() {
        let tasks = shared_tasks(vec![TaskState::new("1", "a", true)]);
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);
        let completed_lifecycle = engine.lifecycle();

        bridge.decline(&mut engine).unwrap();

        assert!(!bridge.is_pending());
        assert_eq!(bridge.sink().record_count(), 0);
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert!(engine.lifecycle() > completed_lifecycle);
    }

    #[test]
    fn test_cancel_from_notes_logs_nothing() {
        let tasks = shared_tasks(Vec::new());
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        bridge.rate(3).unwrap();
        bridge.continue_to_notes().unwrap();
        bridge.cancel(&mut engine).unwrap();

        assert_eq!(bridge.sink().record_count(), 0);
        assert!(matches!(bridge.submit(), Err(SessionError::NoPendingSession)));
    }

    #[test]
    fn test_duplicate_completion_event_is_ignored() {
        let tasks = shared_tasks(Vec::new());
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        let completion = sprint_timer::timer::Completion {
            duration_seconds: 60,
            lifecycle: engine.lifecycle(),
        };
        assert!(bridge
            .observe(&TimerEvent::Completed(completion))
            .is_none());
        assert_eq!(bridge.step(), Some(ConfirmationStep::Rating));
    }
}

mod persistence {
    use super::*;

    #[test]
    fn test_sink_failure_keeps_notes_step() {
        let tasks = shared_tasks(Vec::new());
        let (mut engine, ticker, clock) = engine(60);
        let mut bridge = SessionBridge::new(task_source(&tasks), MemorySessionSink::new());
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        bridge.skip_rating().unwrap();
        bridge.set_notes("keep me").unwrap();

        bridge.sink().set_should_fail(true);
        let err = bridge.submit().unwrap_err();
        assert!(err.is_sink_error());
        assert_eq!(bridge.step(), Some(ConfirmationStep::Notes));

        bridge.sink().set_should_fail(false);
        let record = bridge.submit().unwrap();
        assert_eq!(record.improvement_notes.as_deref(), Some("keep me"));
    }

    #[test]
    fn test_json_store_round_trip_through_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let tasks = shared_tasks(vec![TaskState::new("t1", "draft", true)]);
        let (mut engine, ticker, clock) = engine(120);
        let mut bridge = SessionBridge::new(task_source(&tasks), JsonSessionStore::new(&path));
        run_to_completion(&mut engine, &ticker, &clock, &mut bridge);

        bridge.accept().unwrap();
        bridge.rate(1).unwrap();
        bridge.continue_to_notes().unwrap();
        let record = bridge.submit().unwrap();
        bridge.reflect("t1", "too many meetings").unwrap();
        bridge.save_reflections(&mut engine).unwrap();

        let stored = JsonSessionStore::new(&path).load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, record.id);
        assert_eq!(stored[0].focus_rating, Some(1));
        assert_eq!(stored[0].task_reflections["t1"], "too many meetings");
    }
}
