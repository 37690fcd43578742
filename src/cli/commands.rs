//! Command definitions for the sprint CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{DriverKind, MAX_MINUTES};

// ============================================================================
// CLI Structure
// ============================================================================

/// Sprint timer - focused work sprints with session logging
#[derive(Parser, Debug)]
#[command(
    name = "sprint",
    version,
    about = "集中スプリント用カウントダウンタイマー",
    long_about = "一時停止・再開に強いカウントダウンタイマー。\n\
                  完了時にタスクの達成状況を記録し、集中度とメモを残せます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a countdown and log the session when it completes
    Start(StartArgs),

    /// List logged sessions, newest first
    History(HistoryArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Tick execution context selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverArg {
    Thread,
    Tokio,
    Inline,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Thread => DriverKind::Thread,
            DriverArg::Tokio => DriverKind::Tokio,
            DriverArg::Inline => DriverKind::Inline,
        }
    }
}

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Countdown length in minutes (1-240)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES as i64)
    )]
    pub minutes: Option<u32>,

    /// Task list file (JSON array of {id, text, completed})
    #[arg(short, long)]
    pub tasks: Option<PathBuf>,

    /// Session store file
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Tick execution context
    #[arg(short, long, value_enum)]
    pub driver: Option<DriverArg>,
}

/// Arguments for the history command
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Session store file
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Maximum number of sessions to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

// ============================================================================
// Tests
// ============================================================================
