//! Countdown engine error types.
//!
//! The engine performs no I/O, so the taxonomy is narrow: configuration
//! rejections and tick driver start-up failures. Misuse such as pausing a
//! paused timer is a defined no-op and never surfaces here.

use thiserror::Error;

/// Errors that can occur while configuring or starting a countdown.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Duration must be a positive number of seconds.
    #[error("タイマー時間が不正です: {duration_seconds}秒")]
    InvalidConfiguration {
        /// The rejected duration
        duration_seconds: u32,
    },

    /// Minutes outside the accepted range.
    #[error("タイマー時間は1-240分の範囲で指定してください: {minutes}分")]
    DurationOutOfRange {
        /// The rejected minutes
        minutes: u32,
    },

    /// The requested execution context is not available (e.g. no runtime).
    #[error("ティックドライバーが利用できません: {0}")]
    DriverUnavailable(String),

    /// The background tick unit could not be spawned.
    #[error("ティックドライバーの起動に失敗しました: {0}")]
    DriverSpawnFailed(String),
}

impl TimerError {
    /// Returns true if the error was caused by a rejected configuration.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::DurationOutOfRange { .. }
        )
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } | Self::DurationOutOfRange { .. } => {
                "1分以上240分以下の時間を指定してください"
            }
            Self::DriverUnavailable(_) => "設定ファイルで別のドライバーを選択してください",
            Self::DriverSpawnFailed(_) => "アプリケーションを再起動してください",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimerError::InvalidConfiguration {
            duration_seconds: 0,
        };
        assert!(err.to_string().contains("0秒"));

        let err = TimerError::DurationOutOfRange { minutes: 300 };
        assert!(err.to_string().contains("300分"));

        let err = TimerError::DriverUnavailable("no runtime".to_string());
        assert!(err.to_string().contains("no runtime"));

        let err = TimerError::DriverSpawnFailed("os error".to_string());
        assert!(err.to_string().contains("os error"));
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(TimerError::InvalidConfiguration {
            duration_seconds: 0
        }
        .is_configuration_error());
        assert!(TimerError::DurationOutOfRange { minutes: 0 }.is_configuration_error());
        assert!(!TimerError::DriverUnavailable("x".into()).is_configuration_error());
        assert!(!TimerError::DriverSpawnFailed("x".into()).is_configuration_error());
    }

    #[test]
    fn test_suggestion() {
        let err = TimerError::DurationOutOfRange { minutes: 0 };
        assert!(err.suggestion().contains("240分"));

        let err = TimerError::DriverUnavailable("x".into());
        assert!(err.suggestion().contains("ドライバー"));
    }
}
