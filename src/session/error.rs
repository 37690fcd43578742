//! Session bridge error types.

use thiserror::Error;

use super::confirmation::ConfirmationStep;

/// Errors raised by the confirmation workflow.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No completed session is awaiting confirmation.
    #[error("ログ待ちのセッションがありません")]
    NoPendingSession,

    /// The action is not valid at the current step.
    #[error("この操作は現在のステップでは実行できません (期待: {expected}, 現在: {actual})")]
    InvalidStep {
        /// Step the action requires
        expected: ConfirmationStep,
        /// Step the workflow is at
        actual: ConfirmationStep,
    },

    /// Focus rating outside 1-5.
    #[error("集中度は1-5の範囲で指定してください: {0}")]
    InvalidRating(u8),

    /// The persistence collaborator rejected the session.
    #[error("セッションの保存に失敗しました: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No logged session is open for reflections.
    #[error("振り返り対象のセッションがありません")]
    NoLoggedSession,

    /// The task was not part of the logged session.
    #[error("セッションに含まれないタスクです: {0}")]
    UnknownTask(String),
}

impl SessionError {
    /// Returns true if the error came from the persistence collaborator.
    #[must_use]
    pub fn is_sink_error(&self) -> bool {
        matches!(self, Self::Sink(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::InvalidStep {
            expected: ConfirmationStep::Notes,
            actual: ConfirmationStep::Prompt,
        };
        assert!(err.to_string().contains("notes"));
        assert!(err.to_string().contains("prompt"));

        let err = SessionError::InvalidRating(9);
        assert!(err.to_string().contains('9'));

        let err = SessionError::UnknownTask("t-1".to_string());
        assert!(err.to_string().contains("t-1"));
    }

    #[test]
    fn test_is_sink_error() {
        let io = std::io::Error::other("disk full");
        assert!(SessionError::Sink(Box::new(io)).is_sink_error());
        assert!(!SessionError::NoPendingSession.is_sink_error());
    }
}
