//! CLI module for the sprint timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `run`: The interactive countdown and confirmation loop

pub mod commands;
pub mod display;
pub mod run;

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::types::SprintConfig;

pub use commands::{Cli, Commands, DriverArg, HistoryArgs, StartArgs};
pub use display::Display;
pub use run::{resolve_store, run_sprint};

/// Loads the configuration file, falling back to defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<SprintConfig> {
    let config = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("設定ファイルの形式が不正です: {}", path.display()))?
        }
        Some(path) => {
            tracing::debug!(path = %path.display(), "設定ファイルがないためデフォルトを使用します");
            SprintConfig::default()
        }
        None => SprintConfig::default(),
    };

    if let Err(message) = config.validate() {
        bail!(message);
    }
    Ok(config)
}
