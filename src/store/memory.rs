//! In-memory session sink for tests and embedding.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use super::error::StoreError;
use crate::session::SessionSink;
use crate::types::SessionRecord;

#[derive(Debug, Default)]
pub struct MemorySessionSink {
    sessions: Mutex<Vec<SessionRecord>>,
    should_fail: AtomicBool,
}

impl MemorySessionSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Recorded sessions, newest first.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.lock().unwrap().clone()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated failure".to_string()));
        }
        Ok(())
    }
}

impl SessionSink for MemorySessionSink {
    type Error = StoreError;

    fn record_session(&self, record: &SessionRecord) -> Result<(), Self::Error> {
        self.check()?;
        self.sessions.lock().unwrap().insert(0, record.clone());
        Ok(())
    }

    fn update_reflections(
        &self,
        session_id: Uuid,
        reflections: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        session.task_reflections = reflections.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_seconds: 60,
            completed_task_ids: Vec::new(),
            tasks: Vec::new(),
            focus_rating: Some(3),
            improvement_notes: None,
            task_reflections: BTreeMap::new(),
        }
    }

    #[test]
    fn test_records_newest_first() {
        let sink = MemorySessionSink::new();
        let first = record();
        let second = record();

        sink.record_session(&first).unwrap();
        sink.record_session(&second).unwrap();

        assert_eq!(sink.record_count(), 2);
        assert_eq!(sink.sessions()[0].id, second.id);
    }

    #[test]
    fn test_should_fail() {
        let sink = MemorySessionSink::new();
        sink.set_should_fail(true);

        assert!(matches!(
            sink.record_session(&record()),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(sink.record_count(), 0);
    }

    #[test]
    fn test_update_reflections() {
        let sink = MemorySessionSink::new();
        let session = record();
        sink.record_session(&session).unwrap();

        let mut reflections = BTreeMap::new();
        reflections.insert("t".to_string(), "ok".to_string());
        sink.update_reflections(session.id, &reflections).unwrap();

        assert_eq!(sink.sessions()[0].task_reflections, reflections);
    }
}
