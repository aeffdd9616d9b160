//! Widget components for the timer TUI.
//!
//! Each widget borrows the state it draws plus the shared [`Theme`] and
//! [`Symbols`], and implements ratatui's [`Widget`] trait.
//!
//! - [`header`]: App name, running indicator and navigation tabs
//! - [`new_cycle_form`]: Task and minutes inputs with the start/stop control
//! - [`countdown`]: Remaining time and progress gauge
//! - [`history_table`]: Cycle history, newest first
//!
//! [`Theme`]: crate::tui::app::Theme
//! [`Symbols`]: crate::tui::app::Symbols
//! [`Widget`]: ratatui::widgets::Widget

pub mod countdown;
pub mod header;
pub mod history_table;
pub mod new_cycle_form;

pub use countdown::{CountdownWidget, COUNTDOWN_HEIGHT};
pub use header::{HeaderWidget, HEADER_HEIGHT};
pub use history_table::HistoryTableWidget;
pub use new_cycle_form::{NewCycleFormWidget, FORM_HEIGHT};
