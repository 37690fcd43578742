//! Sprint Timer CLI
//!
//! Runs a focused work countdown and, when it completes, asks whether to log
//! the session with the tasks that were done.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use sprint_timer::cli::{
    load_config, resolve_store, run_sprint, Cli, Commands, Display, HistoryArgs,
};
use sprint_timer::types::SprintConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start(args)) => {
            let config = load_config(cli.config.as_deref())?;
            run_sprint(&args, &config).await?;
        }
        Some(Commands::History(args)) => {
            let config = load_config(cli.config.as_deref())?;
            show_history(&args, &config)?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Prints logged sessions, newest first.
fn show_history(args: &HistoryArgs, config: &SprintConfig) -> Result<()> {
    let store = resolve_store(args.store.clone(), config)?;
    let sessions = store.load()?;
    Display::show_history(&sessions, args.limit);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
