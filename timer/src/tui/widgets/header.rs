//! Header widget with the app name and navigation tabs.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Pomodoro Timer • ◔ 24:13                  [F1] Timer  [F2] History │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The running indicator is only shown while a cycle is active. Below
//! [`WIDE_LAYOUT_THRESHOLD`] columns the app name is dropped and only the
//! tabs remain.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::session::DEFAULT_TITLE;
use crate::tui::app::{Screen, Symbols, Theme};

/// Height of the header including borders.
pub const HEADER_HEIGHT: u16 = 3;

/// Minimum width for showing the app name next to the tabs.
const WIDE_LAYOUT_THRESHOLD: u16 = 50;

/// Header bar widget.
#[derive(Debug)]
pub struct HeaderWidget<'a> {
    screen: Screen,
    countdown: Option<&'a str>,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> HeaderWidget<'a> {
    /// Creates a header highlighting `screen`.
    #[must_use]
    pub fn new(screen: Screen, theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            screen,
            countdown: None,
            theme,
            symbols,
        }
    }

    /// Shows the running indicator with the remaining time.
    #[must_use]
    pub fn with_countdown(mut self, countdown: &'a str) -> Self {
        self.countdown = Some(countdown);
        self
    }

    fn tabs_line(&self) -> Line<'a> {
        let mut spans = Vec::new();
        for (key, screen) in [("F1", Screen::Timer), ("F2", Screen::History)] {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            let style = if screen == self.screen {
                self.theme.tab_active
            } else {
                self.theme.tab_inactive
            };
            spans.push(Span::styled(format!("[{key}] {}", screen.label()), style));
        }
        Line::from(spans)
    }

    fn title_line(&self) -> Line<'a> {
        let mut spans = vec![Span::styled(DEFAULT_TITLE, self.theme.title)];
        if let Some(countdown) = self.countdown {
            spans.push(Span::styled(
                format!(" {} ", self.symbols.bullet),
                self.theme.text_muted,
            ));
            spans.push(Span::styled(
                format!("{} {countdown}", self.symbols.running),
                self.theme.status_running,
            ));
        }
        Line::from(spans)
    }
}

impl Widget for HeaderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let tabs = self.tabs_line();
        if area.width < WIDE_LAYOUT_THRESHOLD {
            Paragraph::new(tabs)
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        let tabs_width = tabs.width() as u16;
        let [title_area, tabs_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(tabs_width + 1)])
                .areas(inner);

        Paragraph::new(self.title_line()).render(title_area, buf);
        Paragraph::new(tabs)
            .alignment(Alignment::Right)
            .render(tabs_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::{ASCII_SYMBOLS, UNICODE_SYMBOLS};

    fn render_to_string(widget: HeaderWidget<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, HEADER_HEIGHT);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn header_widget_is_debug() {
        let theme = Theme::default();
        let widget = HeaderWidget::new(Screen::Timer, &theme, &UNICODE_SYMBOLS);
        assert!(format!("{widget:?}").contains("HeaderWidget"));
    }

    #[test]
    fn header_renders_title_and_tabs() {
        let theme = Theme::default();
        let content = render_to_string(HeaderWidget::new(Screen::Timer, &theme, &UNICODE_SYMBOLS), 80);

        assert!(content.contains("Pomodoro Timer"));
        assert!(content.contains("[F1] Timer"));
        assert!(content.contains("[F2] History"));
    }

    #[test]
    fn header_shows_countdown_when_running() {
        let theme = Theme::default();
        let widget =
            HeaderWidget::new(Screen::Timer, &theme, &ASCII_SYMBOLS).with_countdown("24:13");
        let content = render_to_string(widget, 80);

        assert!(content.contains("[~] 24:13"));
    }

    #[test]
    fn header_narrow_layout_keeps_tabs_only() {
        let theme = Theme::default();
        let content = render_to_string(HeaderWidget::new(Screen::History, &theme, &UNICODE_SYMBOLS), 40);

        assert!(!content.contains("Pomodoro Timer"));
        assert!(content.contains("[F2] History"));
    }

    #[test]
    fn header_highlights_active_tab() {
        let theme = Theme::default();
        let widget = HeaderWidget::new(Screen::History, &theme, &UNICODE_SYMBOLS);
        let line = widget.tabs_line();

        assert_eq!(line.spans[0].style, theme.tab_inactive);
        assert_eq!(line.spans[2].style, theme.tab_active);
    }

    #[test]
    fn header_handles_zero_area() {
        let theme = Theme::default();
        let widget = HeaderWidget::new(Screen::Timer, &theme, &UNICODE_SYMBOLS);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
