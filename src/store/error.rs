//! Session store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing local session data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("ファイルの読み書きに失敗しました: {path:?}")]
    Io {
        /// File involved
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not contain valid session data.
    #[error("データの形式が不正です: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No platform data directory could be determined.
    #[error("データディレクトリが見つかりません")]
    DataDirUnavailable,

    /// The session to update does not exist.
    #[error("セッションが見つかりません: {0}")]
    SessionNotFound(uuid::Uuid),

    /// The store refused the write (used by test doubles).
    #[error("ストアが利用できません: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
