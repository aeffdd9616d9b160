//! Terminal setup and RAII restoration for the timer TUI.
//!
//! [`Tui`] enters raw mode and the alternate screen on creation and restores
//! the terminal when dropped. It also owns the terminal window title, which
//! mirrors the countdown while a cycle runs.
//!
//! Call [`install_panic_hook`] once before creating a [`Tui`] so a panic
//! leaves the shell usable and the panic message visible.
//!
//! # Example
//!
//! ```ignore
//! use pomodoro_timer::tui::{install_panic_hook, Tui};
//!
//! install_panic_hook();
//! let mut tui = Tui::new()?;
//! tui.set_title("25:00 | Write spec")?;
//! tui.draw(|frame| {
//!     // render widgets to frame
//! })?;
//! // Terminal restored when `tui` goes out of scope
//! ```

use std::io::{self, Stdout};
use std::panic;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::TuiError;
use crate::session::DEFAULT_TITLE;

/// Installs a panic hook that restores the terminal before the panic message
/// is printed.
///
/// Restoration errors are ignored; the terminal may already be in a bad
/// state when the hook runs.
pub fn install_panic_hook() {
    let previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        previous_hook(panic_info);
    }));
}

/// Best-effort restoration shared by the panic hook and [`Drop`].
fn restore_terminal() {
    let _ = execute!(io::stdout(), SetTitle(""), Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// A ratatui terminal that restores the shell on drop.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    restored: bool,
}

impl Tui {
    /// Enables raw mode, enters the alternate screen and hides the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::TerminalInit`] if any step fails. Steps already
    /// applied are rolled back.
    pub fn new() -> Result<Self, TuiError> {
        enable_raw_mode().map_err(TuiError::TerminalInit)?;

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(TuiError::TerminalInit(e));
        }

        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(t) => t,
            Err(e) => {
                restore_terminal();
                return Err(TuiError::TerminalInit(e));
            }
        };

        Ok(Self {
            terminal,
            title: String::new(),
            restored: false,
        })
    }

    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Render`] if the frame cannot be flushed.
    pub fn draw<F>(&mut self, f: F) -> Result<(), TuiError>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f).map_err(TuiError::Render)?;
        Ok(())
    }

    /// Sets the terminal window title. Unchanged titles are not re-sent.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Render`] if the escape sequence cannot be written.
    pub fn set_title(&mut self, title: &str) -> Result<(), TuiError> {
        if self.title == title {
            return Ok(());
        }
        execute!(self.terminal.backend_mut(), SetTitle(title)).map_err(TuiError::Render)?;
        self.title = title.to_string();
        Ok(())
    }

    /// The title most recently sent to the terminal.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Restores the terminal explicitly, reporting errors.
    ///
    /// The [`Drop`] implementation skips cleanup once this has run.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Render`] if any restoration step fails.
    pub fn restore(&mut self) -> Result<(), TuiError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        execute!(io::stdout(), SetTitle(DEFAULT_TITLE), Show, LeaveAlternateScreen)
            .map_err(TuiError::Render)?;
        disable_raw_mode().map_err(TuiError::Render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if !self.restored {
            restore_terminal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A real Tui needs a terminal; these cover the API surface only.

    #[test]
    fn tui_struct_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Tui>();
    }

    #[test]
    fn install_panic_hook_can_be_called_twice() {
        install_panic_hook();
        install_panic_hook();
        let _ = panic::take_hook();
    }
}
