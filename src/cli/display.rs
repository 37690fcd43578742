//! Display utilities for the sprint CLI.
//!
//! This module provides formatted output for:
//! - Countdown progress
//! - Confirmation prompts
//! - Session history
//! - Error messages

use std::io::{self, Write};

use crate::session::ConfirmationStep;
use crate::types::{format_clock, progress, SessionRecord, SessionSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the banner for a new countdown.
    pub fn show_start(duration_seconds: u32) {
        println!("* タイマーを開始しました ({})", format_clock(f64::from(duration_seconds)));
        println!("  p: 一時停止  r: 再開  x: リセット  q: 終了");
    }

    /// Redraws the progress line in place.
    pub fn show_progress(duration_seconds: u32, remaining_seconds: f64) {
        print!("\r{}", Self::progress_line(duration_seconds, remaining_seconds));
        let _ = io::stdout().flush();
    }

    /// Shows a pause notice.
    pub fn show_paused(remaining_seconds: f64) {
        println!("\n|| 一時停止しました (残り {})", format_clock(remaining_seconds));
    }

    /// Shows a resume notice.
    pub fn show_resumed(remaining_seconds: f64) {
        println!("\n> 再開しました (残り {})", format_clock(remaining_seconds));
    }

    /// Shows a reset notice.
    pub fn show_reset(duration_seconds: u32) {
        println!(
            "\n[] リセットしました ({})  r で開始",
            format_clock(f64::from(duration_seconds))
        );
    }

    /// Shows that the countdown was abandoned.
    pub fn show_aborted() {
        println!("\n[] タイマーを中断しました");
    }

    /// Shows the completion banner and the log prompt.
    pub fn show_completed(snapshot: &SessionSnapshot) {
        println!("\n* タイマーが完了しました");
        println!("{}", Self::log_prompt(snapshot));
    }

    /// Shows the instruction line for a confirmation step.
    pub fn show_step(step: ConfirmationStep) {
        let text = match step {
            ConfirmationStep::Prompt => "記録しますか？ [y/n]  (:c でキャンセル)",
            ConfirmationStep::Rating => {
                "(任意) 集中度を1-5で評価してください  (空行でスキップ、:b で戻る、:c でキャンセル)"
            }
            ConfirmationStep::Notes => {
                "(任意) 次回への改善メモ  (空行で省略、:b で戻る、:c でキャンセル)"
            }
            ConfirmationStep::Resolved => return,
        };
        println!("{}", text);
    }

    /// Shows a success message for a logged session.
    pub fn show_logged(record: &SessionRecord) {
        println!("* セッションを記録しました");
        println!(
            "  {} 分 / 完了タスク {} 件",
            record.duration_seconds / 60,
            record.completed_task_ids.len()
        );
    }

    /// Shows the reflection prompt for one task.
    pub fn show_reflection_prompt(task_text: &str) {
        println!("振り返り - {} (空行でスキップ)", task_text);
    }

    /// Shows that the session was not logged.
    pub fn show_discarded() {
        println!("[] セッションを記録しませんでした");
    }

    /// Shows logged sessions.
    pub fn show_history(records: &[SessionRecord], limit: usize) {
        println!("セッション履歴");
        println!("─────────────────────────────");

        if records.is_empty() {
            println!("記録されたセッションはありません");
            return;
        }

        for record in records.iter().take(limit) {
            println!("{}", Self::history_line(record));
            if let Some(notes) = &record.improvement_notes {
                println!("    メモ: {}", notes);
            }
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Formats the progress line: `12:34  50%`.
    fn progress_line(duration_seconds: u32, remaining_seconds: f64) -> String {
        let percent = (progress(duration_seconds, remaining_seconds) * 100.0).round() as u32;
        format!(
            "{}  {:>3}% 完了 · 合計 {}",
            format_clock(remaining_seconds),
            percent,
            format_clock(f64::from(duration_seconds))
        )
    }

    /// Formats the log prompt summary.
    fn log_prompt(snapshot: &SessionSnapshot) -> String {
        format!(
            "{} 分、完了タスク {} 件のセッションを記録しますか？",
            snapshot.whole_minutes(),
            snapshot.completed_count()
        )
    }

    /// Formats one history entry.
    fn history_line(record: &SessionRecord) -> String {
        let rating = record
            .focus_rating
            .map(|r| format!("  集中度 {}/5", r))
            .unwrap_or_default();
        format!(
            "{}  {} 分  完了タスク {}/{}{}",
            record.started_at.format("%Y-%m-%d %H:%M"),
            record.duration_seconds / 60,
            record.completed_task_ids.len(),
            record.tasks.len(),
            rating
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
