//! Application state and event management for the timer TUI.
//!
//! The main types are:
//!
//! - [`App`]: Owns the [`Session`] and the countdown ticker, maps input to
//!   cycle operations, and runs the event loop
//! - [`AppState`]: Presentation state (screen, form, notices, styling)
//! - [`Screen`]: Current screen being displayed (Timer or History)
//! - [`TuiEvent`]: Terminal events that drive the loop
//! - [`EventHandler`]: Async input poller and UI tick generator
//!
//! # Architecture
//!
//! Two channels feed the event loop:
//!
//! 1. [`EventHandler`] forwards key presses and resizes, plus a UI tick that
//!    keeps relative times on the history screen fresh
//! 2. [`CountdownTicker`] sends a [`CountdownTick`] every tick interval
//!    while a cycle runs
//!
//! Every event is applied to the session on the loop's task, then a frame is
//! drawn. After each event the ticker is reconciled with the session: it runs
//! exactly while a cycle is active.
//!
//! # Example
//!
//! ```ignore
//! use pomodoro_timer::tui::{install_panic_hook, App, Tui};
//!
//! install_panic_hook();
//! let mut tui = Tui::new()?;
//! let mut app = App::new(session, &config);
//! app.run(&mut tui).await?;
//! ```

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_MINUTES_AMOUNT};
use crate::error::{TuiError, ValidationError};
use crate::session::{Session, TickOutcome};
use crate::ticker::{CountdownTick, CountdownTicker};
use crate::tui::terminal::Tui;
use crate::tui::ui;
use crate::types::{NewCycleData, DEFAULT_MAX_MINUTES_AMOUNT, MIN_MINUTES_AMOUNT};

/// Minutes added or removed by the arrow keys in the minutes field.
pub const MINUTES_STEP: u32 = 5;

/// Capacity of the event and countdown channels.
const CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Screen and Form State
// =============================================================================

/// Current screen being displayed in the TUI.
///
/// # Example
///
/// ```
/// use pomodoro_timer::tui::app::Screen;
///
/// assert_eq!(Screen::default(), Screen::Timer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// New-cycle form and countdown.
    #[default]
    Timer,

    /// Table of past and current cycles.
    History,
}

impl Screen {
    /// Tab label shown in the header.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Timer => "Timer",
            Self::History => "History",
        }
    }
}

/// Form field that can receive focus on the timer screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    /// Task label text input.
    #[default]
    Task,

    /// Minutes amount input.
    Minutes,
}

impl FormField {
    /// Moves focus to the other field.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Task => Self::Minutes,
            Self::Minutes => Self::Task,
        }
    }
}

/// State of the new-cycle form.
///
/// Field values are kept as raw text and validated on submit, so the user
/// can type freely and see the error inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycleFormState {
    /// Task label as typed.
    pub task: String,
    /// Minutes amount as typed.
    pub minutes: String,
    /// Field receiving keyboard input.
    pub focused_field: FormField,
    /// Validation error from the last submit attempt.
    pub error: Option<String>,
    default_minutes: u32,
    max_minutes: u32,
}

impl Default for NewCycleFormState {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES_AMOUNT, DEFAULT_MAX_MINUTES_AMOUNT)
    }
}

impl NewCycleFormState {
    /// Creates an empty form with `default_minutes` pre-filled.
    #[must_use]
    pub fn new(default_minutes: u32, max_minutes: u32) -> Self {
        Self {
            task: String::new(),
            minutes: default_minutes.to_string(),
            focused_field: FormField::Task,
            error: None,
            default_minutes,
            max_minutes,
        }
    }

    /// Largest minutes amount the form accepts.
    #[must_use]
    pub fn max_minutes(&self) -> u32 {
        self.max_minutes
    }

    /// Longest accepted input in the minutes field: the digits of the
    /// maximum.
    fn max_minutes_digits(&self) -> usize {
        self.max_minutes.to_string().len()
    }

    /// Types `c` into the focused field. Non-digits are ignored in the
    /// minutes field.
    pub fn insert_char(&mut self, c: char) {
        match self.focused_field {
            FormField::Task => self.task.push(c),
            FormField::Minutes => {
                if c.is_ascii_digit() && self.minutes.len() < self.max_minutes_digits() {
                    self.minutes.push(c);
                }
            }
        }
        self.error = None;
    }

    /// Deletes the last character of the focused field.
    pub fn backspace(&mut self) {
        match self.focused_field {
            FormField::Task => self.task.pop(),
            FormField::Minutes => self.minutes.pop(),
        };
        self.error = None;
    }

    /// Moves focus to the other field.
    pub fn focus_next(&mut self) {
        self.focused_field = self.focused_field.toggle();
    }

    /// Adds `steps` multiples of [`MINUTES_STEP`] to the minutes field,
    /// clamped to the accepted range.
    pub fn step_minutes(&mut self, steps: i64) {
        let current = i64::from(self.minutes.parse::<u32>().unwrap_or(0));
        let next = (current + steps * i64::from(MINUTES_STEP))
            .clamp(i64::from(MIN_MINUTES_AMOUNT), i64::from(self.max_minutes));
        self.minutes = next.to_string();
        self.error = None;
    }

    /// Validates the form.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for an empty task or an invalid or
    /// out-of-range minutes amount.
    pub fn submit(&self) -> Result<NewCycleData, ValidationError> {
        NewCycleData::parse(&self.task, &self.minutes, self.max_minutes)
    }

    /// Clears the form after a cycle was started.
    pub fn reset(&mut self) {
        *self = Self::new(self.default_minutes, self.max_minutes);
    }
}

// =============================================================================
// Theme
// =============================================================================

/// Color theme for the TUI.
///
/// Use [`Theme::from_env()`] to honour `NO_COLOR`.
///
/// # Example
///
/// ```
/// use pomodoro_timer::tui::app::Theme;
///
/// let theme = Theme::default();
/// let mono_theme = Theme::monochrome();
/// let env_theme = Theme::from_env();
/// ```
#[derive(Debug, Clone)]
pub struct Theme {
    // Cycle status
    /// Style for running cycles (default: yellow).
    pub status_running: Style,
    /// Style for completed cycles (default: green).
    pub status_completed: Style,
    /// Style for interrupted cycles (default: red).
    pub status_interrupted: Style,

    // Countdown
    /// Style for countdown digits while running (default: white bold).
    pub countdown_active: Style,
    /// Style for countdown digits while idle (default: dark gray).
    pub countdown_idle: Style,
    /// Style for the progress gauge (default: green).
    pub progress: Style,

    // Navigation
    /// Style for the selected tab (default: cyan bold).
    pub tab_active: Style,
    /// Style for other tabs (default: gray).
    pub tab_inactive: Style,

    // Form
    /// Style for focused input fields (default: cyan bold).
    pub input_focused: Style,
    /// Style for unfocused input fields (default: gray).
    pub input_unfocused: Style,
    /// Style for input error states (default: red).
    pub input_error: Style,
    /// Style for form labels (default: white).
    pub label: Style,
    /// Style for the start button (default: green bold).
    pub button_start: Style,
    /// Style for the stop button (default: red bold).
    pub button_stop: Style,

    // Layout
    /// Style for unfocused borders (default: dark gray).
    pub border: Style,
    /// Style for focused borders (default: cyan).
    pub border_focused: Style,
    /// Style for titles (default: white bold).
    pub title: Style,
    /// Style for notices such as "Cycle finished" (default: green).
    pub notice: Style,
    /// Style for primary text (default: terminal default).
    pub text_primary: Style,
    /// Style for secondary text (default: gray).
    pub text_secondary: Style,
    /// Style for muted text (default: dark gray).
    pub text_muted: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            status_running: Style::default().fg(Color::Yellow),
            status_completed: Style::default().fg(Color::Green),
            status_interrupted: Style::default().fg(Color::Red),

            countdown_active: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            countdown_idle: Style::default().fg(Color::DarkGray),
            progress: Style::default().fg(Color::Green),

            tab_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),

            input_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            input_unfocused: Style::default().fg(Color::Gray),
            input_error: Style::default().fg(Color::Red),
            label: Style::default().fg(Color::White),
            button_start: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            button_stop: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::Cyan),
            title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            notice: Style::default().fg(Color::Green),
            text_primary: Style::default(),
            text_secondary: Style::default().fg(Color::Gray),
            text_muted: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Creates a monochrome theme for `NO_COLOR` support.
    ///
    /// Only modifiers are used, never colors.
    #[must_use]
    pub fn monochrome() -> Self {
        Self {
            status_running: Style::default().add_modifier(Modifier::ITALIC),
            status_completed: Style::default().add_modifier(Modifier::BOLD),
            status_interrupted: Style::default().add_modifier(Modifier::DIM),

            countdown_active: Style::default().add_modifier(Modifier::BOLD),
            countdown_idle: Style::default().add_modifier(Modifier::DIM),
            progress: Style::default(),

            tab_active: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            tab_inactive: Style::default().add_modifier(Modifier::DIM),

            input_focused: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            input_unfocused: Style::default().add_modifier(Modifier::DIM),
            input_error: Style::default().add_modifier(Modifier::BOLD),
            label: Style::default(),
            button_start: Style::default().add_modifier(Modifier::BOLD),
            button_stop: Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),

            border: Style::default(),
            border_focused: Style::default().add_modifier(Modifier::BOLD),
            title: Style::default().add_modifier(Modifier::BOLD),
            notice: Style::default().add_modifier(Modifier::ITALIC),
            text_primary: Style::default(),
            text_secondary: Style::default().add_modifier(Modifier::DIM),
            text_muted: Style::default().add_modifier(Modifier::DIM),
        }
    }

    /// Returns [`Theme::monochrome()`] when `NO_COLOR` is set, the default
    /// theme otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        if std::env::var("NO_COLOR").is_ok() {
            Self::monochrome()
        } else {
            Self::default()
        }
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// Symbol set for the TUI (unicode or ASCII).
///
/// # Example
///
/// ```
/// use pomodoro_timer::tui::app::{Symbols, ASCII_SYMBOLS, UNICODE_SYMBOLS};
///
/// assert_eq!(UNICODE_SYMBOLS.completed, "✓");
/// assert_eq!(ASCII_SYMBOLS.completed, "[+]");
///
/// let symbols = Symbols::detect();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    /// Marker for a running cycle.
    pub running: &'static str,
    /// Marker for a completed cycle.
    pub completed: &'static str,
    /// Marker for an interrupted cycle.
    pub interrupted: &'static str,
    /// Icon on the start button.
    pub start: &'static str,
    /// Icon on the stop button.
    pub stop: &'static str,
    /// Arrow marking the focused field.
    pub arrow: &'static str,
    /// Separator between header items.
    pub bullet: &'static str,
}

/// Unicode symbol set for modern terminals.
pub const UNICODE_SYMBOLS: Symbols = Symbols {
    running: "◔",
    completed: "✓",
    interrupted: "✗",
    start: "▶",
    stop: "■",
    arrow: "→",
    bullet: "•",
};

/// ASCII symbol set for limited terminals.
pub const ASCII_SYMBOLS: Symbols = Symbols {
    running: "[~]",
    completed: "[+]",
    interrupted: "[x]",
    start: ">",
    stop: "#",
    arrow: "->",
    bullet: "*",
};

impl Symbols {
    /// Returns [`ASCII_SYMBOLS`] when `TERM` names the Linux console or a
    /// VT100, [`UNICODE_SYMBOLS`] otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if std::env::var("TERM")
            .map(|t| t.contains("linux") || t.contains("vt100"))
            .unwrap_or(false)
        {
            ASCII_SYMBOLS
        } else {
            UNICODE_SYMBOLS
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self::detect()
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Presentation state of the TUI.
///
/// Cycle data is not stored here; it lives in the [`Session`].
///
/// # Example
///
/// ```
/// use pomodoro_timer::tui::app::{AppState, Screen};
///
/// let mut state = AppState::new(25, 60);
/// assert_eq!(state.screen, Screen::Timer);
/// assert!(!state.should_quit);
///
/// state.quit();
/// assert!(state.should_quit);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Current screen being displayed.
    pub screen: Screen,
    /// New-cycle form on the timer screen.
    pub form: NewCycleFormState,
    /// Rows scrolled past at the top of the history table.
    pub history_offset: usize,
    /// One-line message about the last transition.
    pub notice: Option<String>,
    /// Flag indicating the user requested exit.
    pub should_quit: bool,
    /// Theme configuration.
    pub theme: Theme,
    /// Symbol set (unicode or ASCII).
    pub symbols: Symbols,
}

impl AppState {
    /// Creates state for the timer screen with the given form limits.
    #[must_use]
    pub fn new(default_minutes: u32, max_minutes: u32) -> Self {
        Self {
            form: NewCycleFormState::new(default_minutes, max_minutes),
            theme: Theme::from_env(),
            symbols: Symbols::detect(),
            ..Self::default()
        }
    }

    /// Requests exit from the event loop.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Switches screens, resetting the history scroll position.
    pub fn show(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.history_offset = 0;
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Events produced by the [`EventHandler`].
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Periodic UI refresh.
    Tick,

    /// A key press.
    Key(KeyEvent),

    /// The terminal was resized to (columns, rows).
    Resize(u16, u16),
}

/// Default UI refresh rate.
pub const DEFAULT_TICK_RATE_MS: u64 = 250;

/// Poll timeout for terminal input.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 10;

/// Polls terminal input and generates periodic UI ticks.
///
/// Runs in its own task until the shutdown signal fires or the receiver is
/// dropped. Terminal polling happens in `spawn_blocking` so the synchronous
/// crossterm calls never block the runtime.
#[derive(Debug)]
pub struct EventHandler {
    event_tx: mpsc::Sender<TuiEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a handler with the default tick rate.
    pub fn new(event_tx: mpsc::Sender<TuiEvent>, shutdown_rx: oneshot::Receiver<()>) -> Self {
        Self::with_tick_rate(
            event_tx,
            shutdown_rx,
            Duration::from_millis(DEFAULT_TICK_RATE_MS),
        )
    }

    /// Creates a handler with a custom tick rate.
    pub fn with_tick_rate(
        event_tx: mpsc::Sender<TuiEvent>,
        shutdown_rx: oneshot::Receiver<()>,
        tick_rate: Duration,
    ) -> Self {
        Self {
            event_tx,
            shutdown_rx,
            tick_rate,
        }
    }

    /// Returns the configured tick rate.
    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Runs the event loop until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Event`] if the blocking poll task panics.
    pub async fn run(mut self) -> Result<(), TuiError> {
        let mut tick_interval = tokio::time::interval(self.tick_rate);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tick_interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    debug!("EventHandler received shutdown signal");
                    break;
                }

                _ = tick_interval.tick() => {
                    if self.event_tx.send(TuiEvent::Tick).await.is_err() {
                        debug!("Event receiver dropped, exiting event loop");
                        break;
                    }
                }

                result = async {
                    tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS)).await;
                    tokio::task::spawn_blocking(|| {
                        Self::poll_terminal_event(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS))
                    }).await
                } => {
                    match result {
                        Ok(Some(event)) => {
                            if self.event_tx.send(event).await.is_err() {
                                debug!("Event receiver dropped, exiting event loop");
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(join_error) => {
                            return Err(TuiError::Event(format!(
                                "terminal polling task panicked: {join_error}"
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Polls for one terminal event. Polling errors (no terminal attached)
    /// count as "no event".
    fn poll_terminal_event(timeout: Duration) -> Option<TuiEvent> {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(crossterm_event) => Self::convert_crossterm_event(crossterm_event),
                Err(e) => {
                    tracing::trace!("Failed to read terminal event: {}", e);
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                tracing::trace!("Failed to poll terminal: {}", e);
                None
            }
        }
    }

    /// Keeps key presses and resizes; drops everything else.
    fn convert_crossterm_event(event: CrosstermEvent) -> Option<TuiEvent> {
        match event {
            CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                Some(TuiEvent::Key(key_event))
            }
            CrosstermEvent::Resize(cols, rows) => Some(TuiEvent::Resize(cols, rows)),
            _ => None,
        }
    }
}

// =============================================================================
// Application
// =============================================================================

/// The interactive timer.
///
/// Owns the session, the countdown ticker and the ticker's channel. All
/// cycle operations happen on the task that calls [`App::run`].
#[derive(Debug)]
pub struct App {
    /// Presentation state.
    pub state: AppState,
    session: Session,
    ticker: CountdownTicker,
    countdown_tx: mpsc::Sender<CountdownTick>,
    countdown_rx: Option<mpsc::Receiver<CountdownTick>>,
}

impl App {
    /// Creates the app around `session`.
    #[must_use]
    pub fn new(session: Session, config: &Config) -> Self {
        let (countdown_tx, countdown_rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            state: AppState::new(config.default_minutes, config.max_minutes),
            session,
            ticker: CountdownTicker::new(config.tick_interval),
            countdown_tx,
            countdown_rx: Some(countdown_rx),
        }
    }

    /// The session being driven.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns `true` while the countdown ticker is alive.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Takes the receiving end of the countdown channel.
    ///
    /// Returns `None` once taken.
    pub fn take_countdown_receiver(&mut self) -> Option<mpsc::Receiver<CountdownTick>> {
        self.countdown_rx.take()
    }

    /// Starts the ticker while a cycle runs and cancels it otherwise.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn sync_ticker(&mut self) {
        match (self.session.is_running(), self.ticker.is_running()) {
            (true, false) => self.ticker.start(self.countdown_tx.clone()),
            (false, true) => {
                self.ticker.cancel();
            }
            _ => {}
        }
    }

    /// Applies one terminal event.
    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Tick => {
                if self.session.refresh() {
                    debug!("Session reloaded from storage");
                }
            }
            TuiEvent::Resize(..) => {}
        }
        self.sync_ticker();
    }

    /// Applies one countdown tick.
    pub fn handle_countdown(&mut self) -> TickOutcome {
        let outcome = self.session.tick_now();
        if let TickOutcome::Finished(ref id) = outcome {
            let task = self
                .session
                .store()
                .state()
                .find_cycle(id)
                .map(|cycle| cycle.task.clone())
                .unwrap_or_default();
            self.state.notice = Some(format!("Cycle finished: {task}"));
        }
        self.sync_ticker();
        outcome
    }

    /// Maps a key press to an action on the current screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.quit();
            return;
        }

        match key.code {
            KeyCode::F(1) => return self.state.show(Screen::Timer),
            KeyCode::F(2) => return self.state.show(Screen::History),
            _ => {}
        }

        match self.state.screen {
            Screen::Timer if self.session.is_running() => self.handle_running_key(key),
            Screen::Timer => self.handle_form_key(key),
            Screen::History => self.handle_history_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return self.state.quit(),
            KeyCode::Enter => return self.start_cycle(),
            _ => {}
        }

        let form = &mut self.state.form;
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => form.focus_next(),
            KeyCode::Up if form.focused_field == FormField::Minutes => form.step_minutes(1),
            KeyCode::Down if form.focused_field == FormField::Minutes => form.step_minutes(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
    }

    fn handle_running_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('s') => {
                if self.session.interrupt_current_cycle() {
                    self.state.notice = Some("Cycle interrupted".to_string());
                }
            }
            KeyCode::Char('p') => {
                if self.session.pause_current_cycle() {
                    self.state.notice = Some("Cycle paused".to_string());
                }
            }
            KeyCode::Char('q') => self.state.quit(),
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        let rows = self.session.cycles().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.history_offset = self.state.history_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.history_offset + 1 < rows {
                    self.state.history_offset += 1;
                }
            }
            KeyCode::Home | KeyCode::Char('g') => self.state.history_offset = 0,
            KeyCode::Esc => self.state.show(Screen::Timer),
            KeyCode::Char('q') => self.state.quit(),
            _ => {}
        }
    }

    /// Validates the form and starts a cycle, reporting errors inline.
    fn start_cycle(&mut self) {
        let data = match self.state.form.submit() {
            Ok(data) => data,
            Err(e) => {
                self.state.form.error = Some(e.to_string());
                return;
            }
        };

        match self.session.create_new_cycle(&data) {
            Ok(_) => {
                self.state.form.reset();
                self.state.notice = None;
            }
            Err(e) => self.state.form.error = Some(e.to_string()),
        }
    }

    /// Draws one frame and mirrors the countdown into the window title.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Render`] if the terminal cannot be written.
    pub fn draw(&self, tui: &mut Tui) -> Result<(), TuiError> {
        tui.set_title(&self.session.title())?;
        tui.draw(|frame| ui::render(frame, &self.state, &self.session))
    }

    /// Runs the event loop until the user quits.
    ///
    /// A running cycle is left running on exit; it resumes on the next start.
    ///
    /// # Errors
    ///
    /// Returns a [`TuiError`] if drawing fails or the loop was already run.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<(), TuiError> {
        let mut countdown_rx = self
            .take_countdown_receiver()
            .ok_or_else(|| TuiError::Event("countdown channel already taken".to_string()))?;
        let (event_tx, mut event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handler = tokio::spawn(EventHandler::new(event_tx, shutdown_rx).run());

        self.sync_ticker();
        let result = self.event_loop(tui, &mut event_rx, &mut countdown_rx).await;

        self.ticker.cancel();
        let _ = shutdown_tx.send(());
        match handler.await {
            Ok(Err(e)) => warn!(error = %e, "Event handler stopped with an error"),
            Err(e) => warn!(error = %e, "Event handler task failed"),
            Ok(Ok(())) => {}
        }

        result
    }

    async fn event_loop(
        &mut self,
        tui: &mut Tui,
        event_rx: &mut mpsc::Receiver<TuiEvent>,
        countdown_rx: &mut mpsc::Receiver<CountdownTick>,
    ) -> Result<(), TuiError> {
        self.draw(tui)?;

        while !self.state.should_quit {
            tokio::select! {
                Some(CountdownTick) = countdown_rx.recv() => {
                    self.handle_countdown();
                }
                event = event_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
            self.draw(tui)?;
        }

        Ok(())
    }
}
