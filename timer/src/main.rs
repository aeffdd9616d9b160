//! Pomodoro Timer - focus cycles in the terminal.
//!
//! # Commands
//!
//! - `pomodoro-timer` / `pomodoro-timer run`: Open the interactive timer
//! - `pomodoro-timer start --task <TASK>`: Start a cycle and follow its countdown
//! - `pomodoro-timer stop`: Interrupt the running cycle
//! - `pomodoro-timer status`: Show the running cycle
//! - `pomodoro-timer history`: List every recorded cycle
//!
//! # Environment Variables
//!
//! See the [`config`](pomodoro_timer::config) module for available
//! configuration options.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pomodoro_timer::config::Config;
use pomodoro_timer::history::history_entries;
use pomodoro_timer::session::{Session, SystemClock, TickOutcome};
use pomodoro_timer::storage::FileStorage;
use pomodoro_timer::store::CycleStore;
use pomodoro_timer::ticker::{CountdownTick, CountdownTicker};
use pomodoro_timer::tui::{install_panic_hook, App, Tui};

/// Pomodoro Timer - focus cycles in the terminal.
///
/// Runs one timed work cycle at a time and keeps a history of every cycle
/// across restarts.
#[derive(Parser, Debug)]
#[command(name = "pomodoro-timer")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    POMODORO_DATA_DIR          State directory (default: ~/.pomodoro-timer)
    POMODORO_TICK_INTERVAL_MS  Countdown tick interval (default: 1000)
    POMODORO_DEFAULT_MINUTES   Minutes pre-filled for a new cycle (default: 25)
    POMODORO_MAX_MINUTES       Largest accepted minutes amount (default: 60)
    NO_COLOR                   Render the TUI without colors
    RUST_LOG                   Log filter (default: info; the TUI logs to
                               <data dir>/pomodoro-timer.log)

EXAMPLES:
    # Open the interactive timer
    pomodoro-timer

    # Work on a task for 25 minutes in the foreground
    pomodoro-timer start --task \"Write report\" --minutes 25

    # Check the running cycle from another shell
    pomodoro-timer status
")]
struct Cli {
    /// Directory holding the persisted cycles (overrides POMODORO_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive timer (default).
    Run,

    /// Start a new cycle and follow its countdown.
    ///
    /// Ctrl+C interrupts the cycle. With --detach the cycle keeps running in
    /// the background and can be picked up by `run` or `status`.
    Start {
        /// What you will work on.
        #[arg(short, long)]
        task: String,

        /// Planned duration (default: POMODORO_DEFAULT_MINUTES).
        #[arg(short, long)]
        minutes: Option<u32>,

        /// Return right after starting the cycle.
        #[arg(short, long)]
        detach: bool,
    },

    /// Interrupt the running cycle.
    Stop,

    /// Show the running cycle and its remaining time.
    Status,

    /// List every recorded cycle, newest first.
    History,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            init_file_logging(&config)?;
            let runtime = build_runtime()?;
            runtime.block_on(run_tui(config))
        }
        Command::Start {
            task,
            minutes,
            detach,
        } => {
            init_logging();
            let runtime = build_runtime()?;
            runtime.block_on(run_start(config, &task, minutes, detach))
        }
        Command::Stop => {
            init_logging();
            run_stop(&config)
        }
        Command::Status => {
            init_logging();
            run_status(&config)
        }
        Command::History => {
            init_logging();
            run_history(&config)
        }
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

/// Loads the persisted session from the configured data directory.
fn open_session(config: &Config) -> Session {
    debug!(data_dir = %config.data_dir.display(), "Opening session");
    let store = CycleStore::load(Box::new(FileStorage::new(&config.data_dir)));
    Session::new(store, Arc::new(SystemClock))
}

/// Runs the interactive timer until the user quits.
async fn run_tui(config: Config) -> Result<()> {
    let session = open_session(&config);
    let mut app = App::new(session, &config);

    install_panic_hook();
    let mut tui = Tui::new().context("Failed to initialize terminal")?;
    let result = app.run(&mut tui).await;
    tui.restore().context("Failed to restore terminal")?;

    if app.session().is_running() {
        info!("Leaving the timer with a cycle still running");
    }
    result.context("Timer UI failed")
}

/// Starts a cycle and, unless detached, counts it down in the foreground.
async fn run_start(config: Config, task: &str, minutes: Option<u32>, detach: bool) -> Result<()> {
    let minutes = minutes.unwrap_or(config.default_minutes);

    let mut session = open_session(&config);
    // Let an overdue cycle finish before checking for a running one.
    session.tick_now();
    session
        .start_cycle(task, minutes, config.max_minutes)
        .context("Failed to start cycle")?;

    let task = session
        .active_cycle()
        .map(|cycle| cycle.task.clone())
        .unwrap_or_default();
    println!("Started \"{task}\" for {minutes} minute(s)");
    if detach {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<CountdownTick>(1);
    let mut ticker = CountdownTicker::new(config.tick_interval);
    ticker.start(tx);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    print_countdown(&session)?;
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                println!();
                if session.interrupt_current_cycle() {
                    println!("Interrupted \"{task}\"");
                }
                break;
            }

            Some(CountdownTick) = rx.recv() => {
                match session.tick_now() {
                    TickOutcome::Running { .. } => print_countdown(&session)?,
                    TickOutcome::Finished(_) => {
                        println!();
                        println!("Finished \"{task}\"");
                        break;
                    }
                    TickOutcome::Idle => {
                        println!();
                        println!("Cycle was stopped from another shell");
                        break;
                    }
                }
            }

            else => break,
        }
    }

    ticker.cancel();
    Ok(())
}

fn print_countdown(session: &Session) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "\r{}  ", session.title()).context("Failed to write countdown")?;
    stdout.flush().context("Failed to flush stdout")
}

fn run_stop(config: &Config) -> Result<()> {
    let mut session = open_session(config);
    if let TickOutcome::Finished(_) = session.tick_now() {
        println!("Cycle had already finished");
        return Ok(());
    }

    let task = session.active_cycle().map(|cycle| cycle.task.clone());
    match task {
        Some(task) if session.interrupt_current_cycle() => println!("Interrupted \"{task}\""),
        _ => println!("No cycle running"),
    }
    Ok(())
}

fn run_status(config: &Config) -> Result<()> {
    let mut session = open_session(config);
    session.tick_now();

    match session.active_cycle() {
        Some(cycle) => println!(
            "{} \"{}\": {} left of {} minute(s)",
            cycle.status().label(),
            cycle.task,
            session.countdown(),
            cycle.minutes_amount
        ),
        None => println!("No cycle running"),
    }
    Ok(())
}

fn run_history(config: &Config) -> Result<()> {
    let mut session = open_session(config);
    session.tick_now();

    let entries = history_entries(session.cycles(), session.now());
    if entries.is_empty() {
        println!("No cycles yet");
        return Ok(());
    }

    let task_width = entries
        .iter()
        .map(|entry| entry.task.chars().count())
        .max()
        .unwrap_or(0)
        .max("Task".len());

    println!(
        "{:<task_width$}  {:<12}  {:<24}  Status",
        "Task", "Duration", "Started"
    );
    for entry in &entries {
        println!(
            "{:<task_width$}  {:<12}  {:<24}  {}",
            entry.task,
            entry.duration,
            entry.started,
            entry.status.label()
        );
    }
    Ok(())
}

/// Initializes logging to stderr for the headless commands.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}

/// Initializes logging to the log file while the TUI owns the terminal.
fn init_file_logging(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;
    let log_path = config.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
