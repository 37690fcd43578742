//! JSON file backed session history and task list.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::error::StoreError;
use crate::session::{SessionSink, TaskSource};
use crate::types::{SessionRecord, TaskState};

const APP_DIR: &str = "sprint-timer";
const SESSIONS_FILE: &str = "sessions.json";

// ============================================================================
// JsonSessionStore
// ============================================================================

/// Session history kept as a JSON array, newest first. Last write wins.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the store in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataDirUnavailable`] if no data directory exists.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `<data dir>/sprint-timer/sessions.json`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(SESSIONS_FILE))
            .ok_or(StoreError::DataDirUnavailable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all sessions. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<SessionRecord>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Replaces the stored history.
    pub fn save(&self, sessions: &[SessionRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        let json = serde_json::to_vec_pretty(sessions)?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Prepends one session.
    pub fn add(&self, session: SessionRecord) -> Result<(), StoreError> {
        let mut sessions = self.load()?;
        sessions.insert(0, session);
        self.save(&sessions)
    }

    /// Replaces the reflections of one session.
    pub fn set_reflections(
        &self,
        session_id: Uuid,
        reflections: BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.load()?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        session.task_reflections = reflections;
        self.save(&sessions)
    }
}

impl SessionSink for JsonSessionStore {
    type Error = StoreError;

    fn record_session(&self, record: &SessionRecord) -> Result<(), Self::Error> {
        self.add(record.clone())?;
        tracing::debug!(path = ?self.path, "セッションをファイルに追加しました");
        Ok(())
    }

    fn update_reflections(
        &self,
        session_id: Uuid,
        reflections: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error> {
        self.set_reflections(session_id, reflections.clone())
    }
}

// ============================================================================
// JsonTaskList
// ============================================================================

/// Task list read from a JSON array of `{ id, text, completed }`.
///
/// The file is re-read on every call so a snapshot sees edits made while the
/// countdown was running.
#[derive(Debug, Clone)]
pub struct JsonTaskList {
    path: PathBuf,
}

impl JsonTaskList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<TaskState>, StoreError> {
        let bytes = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl TaskSource for JsonTaskList {
    fn current_tasks(&self) -> Vec<TaskState> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "タスクリストを読み込めませんでした");
            Vec::new()
        })
    }
}
