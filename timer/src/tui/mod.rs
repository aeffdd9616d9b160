//! Terminal user interface for the Pomodoro Timer.
//!
//! Built with [`ratatui`] on a crossterm backend. The TUI has two screens:
//! the timer (new-cycle form and countdown) and the history table.
//!
//! # Submodules
//!
//! - [`app`]: Application state, key handling and the event loop
//! - [`ui`]: Frame layout and screen composition
//! - [`terminal`]: Terminal setup and cleanup with panic handling
//! - [`widgets`]: Header, form, countdown and history widgets
//!
//! # Usage
//!
//! ```ignore
//! use pomodoro_timer::tui::{install_panic_hook, App, Tui};
//!
//! install_panic_hook();
//! let mut tui = Tui::new()?;
//! let mut app = App::new(session, &config);
//! app.run(&mut tui).await?;
//! tui.restore()?;
//! ```

pub mod app;
pub mod terminal;
pub mod ui;
pub mod widgets;

pub use app::{App, AppState, Screen, TuiEvent};
pub use terminal::{install_panic_hook, Tui};
