//! UI rendering functions for the timer TUI.
//!
//! [`render`] composes the header, the current screen and a key-hint footer:
//!
//! ```text
//! render() --> header
//!          --> match state.screen {
//!                  Timer   --> render_timer_screen()
//!                  History --> render_history_screen()
//!              }
//!          --> footer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pomodoro_timer::tui::ui::render;
//!
//! tui.draw(|frame| render(frame, &app.state, app.session()))?;
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::Line,
    widgets::Paragraph,
    Frame,
};

use crate::history::history_entries;
use crate::session::Session;
use crate::tui::app::{AppState, Screen};
use crate::tui::widgets::{
    CountdownWidget, HeaderWidget, HistoryTableWidget, NewCycleFormWidget, COUNTDOWN_HEIGHT,
    FORM_HEIGHT, HEADER_HEIGHT,
};

/// Narrowest terminal the layout supports.
pub const MIN_WIDTH: u16 = 40;

/// Shortest terminal the layout supports.
pub const MIN_HEIGHT: u16 = 12;

/// Widest the timer screen panels grow.
const MAX_PANEL_WIDTH: u16 = 64;

/// Renders one full frame.
pub fn render(frame: &mut Frame, state: &AppState, session: &Session) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        render_size_warning(frame, area, state);
        return;
    }

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let countdown = session.countdown().to_string();
    let mut header = HeaderWidget::new(state.screen, &state.theme, &state.symbols);
    if session.is_running() {
        header = header.with_countdown(&countdown);
    }
    frame.render_widget(header, header_area);

    match state.screen {
        Screen::Timer => render_timer_screen(frame, body_area, state, session),
        Screen::History => render_history_screen(frame, body_area, state, session),
    }

    let hints = Paragraph::new(key_hints(state.screen, session.is_running()))
        .style(state.theme.text_muted)
        .alignment(Alignment::Center);
    frame.render_widget(hints, footer_area);
}

/// Form, countdown and the last notice, centered horizontally.
fn render_timer_screen(frame: &mut Frame, area: Rect, state: &AppState, session: &Session) {
    let width = area.width.min(MAX_PANEL_WIDTH);
    let column = Rect::new(
        area.x + (area.width - width) / 2,
        area.y,
        width,
        area.height,
    );

    let [form_area, countdown_area, notice_area, _] = Layout::vertical([
        Constraint::Length(FORM_HEIGHT),
        Constraint::Length(COUNTDOWN_HEIGHT),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(column);

    let form = NewCycleFormWidget::new(&state.form, &state.theme, &state.symbols)
        .with_active_cycle(session.active_cycle());
    frame.render_widget(form, form_area);

    let mut countdown = CountdownWidget::new(session.countdown(), &state.theme, &state.symbols);
    if session.is_running() {
        countdown = countdown.running(session.amount_seconds_passed(), session.total_seconds());
    }
    frame.render_widget(countdown, countdown_area);

    if let Some(ref notice) = state.notice {
        let notice = Paragraph::new(notice.as_str())
            .style(state.theme.notice)
            .alignment(Alignment::Center);
        frame.render_widget(notice, notice_area);
    }
}

fn render_history_screen(frame: &mut Frame, area: Rect, state: &AppState, session: &Session) {
    let entries = history_entries(session.cycles(), session.now());
    let table = HistoryTableWidget::new(
        &entries,
        state.history_offset,
        &state.theme,
        &state.symbols,
    );
    frame.render_widget(table, area);
}

fn render_size_warning(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines = vec![
        Line::from("Terminal too small"),
        Line::from(format!(
            "{}x{} < {MIN_WIDTH}x{MIN_HEIGHT}",
            area.width, area.height
        )),
    ];
    let y = area.y + area.height.saturating_sub(2) / 2;
    let warning_area = Rect::new(area.x, y, area.width, area.height.min(2));
    frame.render_widget(
        Paragraph::new(lines)
            .style(state.theme.input_error)
            .alignment(Alignment::Center),
        warning_area,
    );
}

/// Footer key hints for the current screen.
#[must_use]
pub fn key_hints(screen: Screen, running: bool) -> &'static str {
    match (screen, running) {
        (Screen::Timer, false) => "Enter start · Tab switch field · Esc quit · F2 history",
        (Screen::Timer, true) => "Enter/s stop · p pause · q quit · F2 history",
        (Screen::History, _) => "↑/↓ scroll · Esc back · q quit · F1 timer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use ratatui::{backend::TestBackend, Terminal};

    use crate::session::ManualClock;
    use crate::store::CycleStore;
    use crate::types::NewCycleData;

    fn create_test_terminal_with_size(width: u16, height: u16) -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(width, height)).unwrap()
    }

    fn test_session() -> (Session, ManualClock) {
        let clock = ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let session = Session::new(CycleStore::in_memory(), Arc::new(clock.clone()));
        (session, clock)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    // =========================================================================
    // Timer screen
    // =========================================================================

    #[test]
    fn render_idle_timer_screen() {
        let mut terminal = create_test_terminal_with_size(80, 30);
        let state = AppState::new(25, 60);
        let (session, _) = test_session();

        terminal
            .draw(|f| render(f, &state, &session))
            .expect("Drawing timer screen should not fail");

        let text = screen_text(&terminal);
        assert!(text.contains("Pomodoro Timer"));
        assert!(text.contains("New cycle"));
        assert!(text.contains("0 0 : 0 0"));
        assert!(text.contains("Enter start"));
    }

    #[test]
    fn render_running_timer_screen() {
        let mut terminal = create_test_terminal_with_size(80, 30);
        let state = AppState::new(25, 60);
        let (mut session, clock) = test_session();
        session
            .create_new_cycle(&NewCycleData::new("Write spec", 25).unwrap())
            .unwrap();
        clock.advance(Duration::seconds(90));
        session.tick_now();

        terminal.draw(|f| render(f, &state, &session)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("2 3 : 3 0"));
        assert!(text.contains("23:30"));
        assert!(text.contains("Write spec"));
        assert!(text.contains("p pause"));
    }

    #[test]
    fn render_notice() {
        let mut terminal = create_test_terminal_with_size(80, 30);
        let mut state = AppState::new(25, 60);
        state.notice = Some("Cycle finished: Write spec".to_string());
        let (session, _) = test_session();

        terminal.draw(|f| render(f, &state, &session)).unwrap();

        assert!(screen_text(&terminal).contains("Cycle finished: Write spec"));
    }

    // =========================================================================
    // History screen
    // =========================================================================

    #[test]
    fn render_history_screen_lists_cycles() {
        let mut terminal = create_test_terminal_with_size(100, 20);
        let mut state = AppState::new(25, 60);
        state.show(Screen::History);
        let (mut session, clock) = test_session();
        session
            .create_new_cycle(&NewCycleData::new("Write spec", 25).unwrap())
            .unwrap();
        session.interrupt_current_cycle();
        clock.advance(Duration::hours(2));

        terminal.draw(|f| render(f, &state, &session)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("My history (1)"));
        assert!(text.contains("Write spec"));
        assert!(text.contains("25 minutes"));
        assert!(text.contains("about 2 hours ago"));
        assert!(text.contains("Interrupted"));
    }

    // =========================================================================
    // Layout edge cases
    // =========================================================================

    #[test]
    fn render_small_terminal_shows_warning() {
        let mut terminal = create_test_terminal_with_size(30, 8);
        let state = AppState::new(25, 60);
        let (session, _) = test_session();

        terminal.draw(|f| render(f, &state, &session)).unwrap();

        assert!(screen_text(&terminal).contains("Terminal too small"));
    }

    #[test]
    fn render_large_terminal() {
        let mut terminal = create_test_terminal_with_size(200, 60);
        let state = AppState::new(25, 60);
        let (session, _) = test_session();
        terminal.draw(|f| render(f, &state, &session)).unwrap();
    }

    #[test]
    fn key_hints_per_screen() {
        assert!(key_hints(Screen::Timer, false).contains("start"));
        assert!(key_hints(Screen::Timer, true).contains("stop"));
        assert!(key_hints(Screen::History, true).contains("back"));
    }
}
