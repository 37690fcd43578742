//! Interactive countdown for `sprint start`.
//!
//! The engine's ticks, stdin commands and Ctrl-C are multiplexed on a single
//! tokio task. When the countdown completes the task list is snapshotted
//! immediately and the confirmation workflow runs on stdin.

use std::future::Future;
use std::io::BufRead;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::commands::StartArgs;
use super::display::Display;
use crate::clock::MonotonicClock;
use crate::session::{ConfirmationStep, Rearm, SessionBridge, SessionSink, TaskSource};
use crate::store::{JsonSessionStore, JsonTaskList};
use crate::timer::{
    Completion, CountdownEngine, InlineTicker, ThreadTickDriver, TimerEvent, TokioTickDriver,
    DEFAULT_TICK_INTERVAL,
};
use crate::types::{DriverKind, SprintConfig, TaskState, TimerConfig};

type StdinLines = mpsc::UnboundedReceiver<String>;

/// Commands accepted on stdin while the countdown runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
    Pause,
    Resume,
    Reset,
    Quit,
}

impl RunCommand {
    /// Parses one input line; unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" | "start" => Some(Self::Resume),
            "x" | "reset" => Some(Self::Reset),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// What the next wait on the user produced.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Line(String),
    Closed,
    Interrupted,
}

/// Waits for the next stdin line or the interrupt, whichever comes first.
///
/// The interrupt must not be polled again once it has fired.
async fn next_input<I: Future>(lines: &mut StdinLines, interrupt: Pin<&mut I>) -> Input {
    tokio::select! {
        line = lines.recv() => line.map_or(Input::Closed, Input::Line),
        _ = interrupt => Input::Interrupted,
    }
}

/// Input at a confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Back,
    Cancel,
    Text(String),
}

impl StepInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            ":b" => Self::Back,
            ":c" => Self::Cancel,
            _ => Self::Text(line.to_string()),
        }
    }
}

/// Resolves the session store location.
pub fn resolve_store(store: Option<PathBuf>, config: &SprintConfig) -> Result<JsonSessionStore> {
    match store.or_else(|| config.store_path.clone()) {
        Some(path) => Ok(JsonSessionStore::new(path)),
        None => JsonSessionStore::open_default().context("セッションストアを開けませんでした"),
    }
}

/// Runs one sprint end to end.
pub async fn run_sprint(args: &StartArgs, config: &SprintConfig) -> Result<()> {
    let minutes = args.minutes.unwrap_or(config.default_minutes);
    let timer_config = TimerConfig::from_minutes(minutes)?;
    let interval = config.tick_interval();
    let driver = args.driver.map(DriverKind::from).unwrap_or(config.driver);
    let store = resolve_store(args.store.clone(), config)?;

    let task_list = args.tasks.clone().map(JsonTaskList::new);
    let tasks = move || -> Vec<TaskState> {
        task_list
            .as_ref()
            .map(|list| list.current_tasks())
            .unwrap_or_default()
    };

    let (mut engine, inline_ticker): (CountdownEngine, Option<InlineTicker>) = match driver {
        DriverKind::Thread => (
            CountdownEngine::new(timer_config, MonotonicClock, ThreadTickDriver::new(interval)),
            None,
        ),
        DriverKind::Tokio => (
            CountdownEngine::new(timer_config, MonotonicClock, TokioTickDriver::new(interval)?),
            None,
        ),
        DriverKind::Inline => {
            let (engine, ticker) = CountdownEngine::inline(timer_config, MonotonicClock);
            (engine, Some(ticker))
        }
    };
    tracing::debug!(?driver, minutes, "スプリントを準備しました");

    let mut events = engine.subscribe();
    let mut bridge = SessionBridge::new(tasks, store);
    let mut lines = spawn_stdin_reader()?;

    Display::show_start(timer_config.duration_seconds());
    engine.start()?;

    // One handler for the whole run; once it fires the run ends.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let ticker = inline_ticker.as_ref().map(|ticker| (ticker, interval));
    let Some(completion) = countdown(
        &mut engine,
        ticker,
        &mut events,
        &mut bridge,
        &mut lines,
        ctrl_c.as_mut(),
    )
    .await?
    else {
        return Ok(());
    };

    // Already captured if the Completed event was drained; a no-op then.
    bridge.on_completion(completion);
    if let Some(snapshot) = bridge.snapshot() {
        Display::show_completed(snapshot);
    }

    confirm(&mut engine, &mut bridge, &mut lines, ctrl_c.as_mut()).await
}

/// Drives the countdown until completion, quit or Ctrl-C.
async fn countdown<T: TaskSource, S: SessionSink, I: Future>(
    engine: &mut CountdownEngine,
    inline_ticker: Option<(&InlineTicker, Duration)>,
    events: &mut mpsc::UnboundedReceiver<TimerEvent>,
    bridge: &mut SessionBridge<T, S>,
    lines: &mut StdinLines,
    mut interrupt: Pin<&mut I>,
) -> Result<Option<Completion>> {
    let duration_seconds = engine.config().duration_seconds();
    // Only polled for the inline driver; the others tick on their own.
    let pump_interval = inline_ticker.map_or(DEFAULT_TICK_INTERVAL, |(_, interval)| interval);
    let mut pump = tokio::time::interval(pump_interval);
    pump.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdin_open = true;

    loop {
        drain_events(events, bridge, duration_seconds);

        tokio::select! {
            outcome = engine.next_tick() => {
                if let Some(completion) = outcome.completion() {
                    drain_events(events, bridge, duration_seconds);
                    return Ok(Some(completion));
                }
            }
            _ = pump.tick(), if inline_ticker.is_some() => {
                if let Some((ticker, _)) = inline_ticker {
                    ticker.fire();
                }
            }
            line = lines.recv(), if stdin_open => {
                match line {
                    Some(line) => match RunCommand::parse(&line) {
                        Some(RunCommand::Pause) => engine.pause(),
                        Some(RunCommand::Resume) => engine.start()?,
                        Some(RunCommand::Reset) => engine.reset(),
                        Some(RunCommand::Quit) => {
                            engine.reset();
                            Display::show_aborted();
                            return Ok(None);
                        }
                        None => tracing::debug!(input = %line, "unknown command"),
                    },
                    None => stdin_open = false,
                }
            }
            _ = interrupt.as_mut() => {
                engine.reset();
                Display::show_aborted();
                return Ok(None);
            }
        }
    }
}

/// Renders queued engine events and feeds them to the bridge.
fn drain_events<T: TaskSource, S: SessionSink>(
    events: &mut mpsc::UnboundedReceiver<TimerEvent>,
    bridge: &mut SessionBridge<T, S>,
    duration_seconds: u32,
) {
    while let Ok(event) = events.try_recv() {
        bridge.observe(&event);
        match event {
            TimerEvent::RemainingChanged { remaining_seconds } => {
                Display::show_progress(duration_seconds, remaining_seconds)
            }
            TimerEvent::Paused { remaining_seconds } => Display::show_paused(remaining_seconds),
            TimerEvent::Resumed { remaining_seconds } => Display::show_resumed(remaining_seconds),
            TimerEvent::Reset {
                duration_seconds, ..
            } => Display::show_reset(duration_seconds),
            TimerEvent::Started { .. }
            | TimerEvent::Configured { .. }
            | TimerEvent::Completed(_) => {}
        }
    }
}

/// Forwards stdin lines from a dedicated thread; the channel closes at EOF.
///
/// A detached thread keeps a blocked read from holding up runtime shutdown.
fn spawn_stdin_reader() -> Result<StdinLines> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("sprint-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "標準入力の読み込みに失敗しました");
                        break;
                    }
                }
            }
        })
        .context("入力スレッドを起動できませんでした")?;
    Ok(rx)
}

/// Walks the confirmation workflow, then collects reflections.
///
/// Ctrl-C or end of input discards the session.
async fn confirm<R: Rearm, T: TaskSource, S: SessionSink, I: Future>(
    engine: &mut R,
    bridge: &mut SessionBridge<T, S>,
    lines: &mut StdinLines,
    mut interrupt: Pin<&mut I>,
) -> Result<()> {
    while let Some(step) = bridge.step() {
        Display::show_step(step);
        let line = match next_input(lines, interrupt.as_mut()).await {
            Input::Line(line) => line,
            Input::Closed | Input::Interrupted => {
                bridge.cancel(engine)?;
                Display::show_discarded();
                return Ok(());
            }
        };

        match (step, StepInput::parse(&line)) {
            (_, StepInput::Cancel) => {
                bridge.cancel(engine)?;
                Display::show_discarded();
                return Ok(());
            }
            (_, StepInput::Back) => {
                bridge.back()?;
            }
            (ConfirmationStep::Prompt, StepInput::Text(answer)) => {
                match answer.trim().to_lowercase().as_str() {
                    "y" | "yes" => {
                        bridge.accept()?;
                    }
                    "n" | "no" => {
                        bridge.decline(engine)?;
                        Display::show_discarded();
                        return Ok(());
                    }
                    _ => {}
                }
            }
            (ConfirmationStep::Rating, StepInput::Text(answer)) => {
                let answer = answer.trim();
                if answer.is_empty() {
                    bridge.skip_rating()?;
                    continue;
                }
                let Ok(value) = answer.parse::<u8>() else {
                    Display::show_error("1から5の数字を入力してください");
                    continue;
                };
                match bridge.rate(value) {
                    Ok(_) => {
                        bridge.continue_to_notes()?;
                    }
                    Err(e) => Display::show_error(&e.to_string()),
                }
            }
            // Notes; a submitted flow is torn down, so no later step is pending.
            (_, StepInput::Text(notes)) => {
                bridge.set_notes(notes)?;
                match bridge.submit() {
                    Ok(record) => {
                        Display::show_logged(&record);
                        return reflect(engine, bridge, lines, &record.tasks, interrupt).await;
                    }
                    // The notes step stays open so the user can retry or cancel.
                    Err(e) if e.is_sink_error() => Display::show_error(&e.to_string()),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(())
}

/// Collects one optional reflection per task of the logged session.
///
/// Ctrl-C skips the reflections; end of input saves what was entered.
async fn reflect<R: Rearm, T: TaskSource, S: SessionSink, I: Future>(
    engine: &mut R,
    bridge: &mut SessionBridge<T, S>,
    lines: &mut StdinLines,
    tasks: &[TaskState],
    mut interrupt: Pin<&mut I>,
) -> Result<()> {
    if tasks.is_empty() {
        bridge.skip_reflections(engine)?;
        return Ok(());
    }

    for task in tasks {
        Display::show_reflection_prompt(&task.text);
        match next_input(lines, interrupt.as_mut()).await {
            Input::Line(text) => bridge.reflect(&task.id, text)?,
            Input::Closed => break,
            Input::Interrupted => {
                bridge.skip_reflections(engine)?;
                return Ok(());
            }
        }
    }
    bridge.save_reflections(engine)?;
    Ok(())
}
