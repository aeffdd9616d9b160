//! Countdown display.
//!
//! Shows the remaining time as spaced `M M : S S` digits with a progress
//! gauge underneath while a cycle runs. When idle the digits read `00:00`
//! in the muted style and the gauge is hidden.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    symbols,
    widgets::{Block, Borders, LineGauge, Paragraph, Widget},
};

use crate::session::Countdown;
use crate::tui::app::{Symbols, Theme};

/// Height of the countdown panel including borders.
pub const COUNTDOWN_HEIGHT: u16 = 5;

/// Countdown digits and progress gauge.
#[derive(Debug)]
pub struct CountdownWidget<'a> {
    countdown: Countdown,
    /// Fraction of the cycle already elapsed, `None` when idle.
    progress: Option<f64>,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> CountdownWidget<'a> {
    /// Creates an idle countdown showing `countdown`.
    #[must_use]
    pub fn new(countdown: Countdown, theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            countdown,
            progress: None,
            theme,
            symbols,
        }
    }

    /// Marks the countdown as running with `elapsed` of `total` seconds done.
    #[must_use]
    pub fn running(mut self, elapsed: u64, total: u64) -> Self {
        let ratio = if total == 0 {
            1.0
        } else {
            (elapsed as f64 / total as f64).clamp(0.0, 1.0)
        };
        self.progress = Some(ratio);
        self
    }

    /// The digits with a space between each character.
    fn spaced_digits(&self) -> String {
        let text = self.countdown.to_string();
        let mut spaced = String::with_capacity(text.len() * 2);
        for (i, c) in text.chars().enumerate() {
            if i > 0 {
                spaced.push(' ');
            }
            spaced.push(c);
        }
        spaced
    }
}

impl Widget for CountdownWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let (border_style, digits_style) = match self.progress {
            Some(_) => (self.theme.border_focused, self.theme.countdown_active),
            None => (self.theme.border, self.theme.countdown_idle),
        };
        let block = Block::default()
            .title(" Countdown ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let [digits_area, _, gauge_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(self.spaced_digits())
            .style(digits_style)
            .alignment(Alignment::Center)
            .render(digits_area, buf);

        if let Some(ratio) = self.progress {
            let line_set = if self.symbols.bullet.is_ascii() {
                symbols::line::NORMAL
            } else {
                symbols::line::THICK
            };
            LineGauge::default()
                .filled_style(self.theme.progress)
                .unfilled_style(self.theme.text_muted)
                .line_set(line_set)
                .ratio(ratio)
                .render(gauge_area, buf);
        }
    }
}
