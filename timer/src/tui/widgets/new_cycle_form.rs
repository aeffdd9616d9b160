//! New-cycle form widget.
//!
//! Collects the task label and the minutes amount, and shows the start/stop
//! control.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────── New cycle ─────────────────┐
//! │  I will work on                            │
//! │  ┌──────────────────────────────────────┐  │
//! │  │ Write spec_                          │  │
//! │  └──────────────────────────────────────┘  │
//! │  for minutes (1-60, Up/Down ±5)            │
//! │  ┌──────────────────────────────────────┐  │
//! │  │ 25                                   │  │
//! │  └──────────────────────────────────────┘  │
//! │  (validation error if any)                 │
//! │                                            │
//! │               ▶ Start                      │
//! └────────────────────────────────────────────┘
//! ```
//!
//! While a cycle runs the inputs are disabled: they show the active cycle's
//! task and minutes in the muted style, and the button turns into Stop.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::tui::app::{FormField, NewCycleFormState, Symbols, Theme};
use crate::types::Cycle;

/// Height of the form panel including borders.
pub const FORM_HEIGHT: u16 = 14;

/// Horizontal padding inside the form border.
const H_PADDING: u16 = 2;

/// Widget for the new-cycle form.
#[derive(Debug)]
pub struct NewCycleFormWidget<'a> {
    state: &'a NewCycleFormState,
    active_cycle: Option<&'a Cycle>,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> NewCycleFormWidget<'a> {
    /// Creates an enabled form.
    #[must_use]
    pub fn new(state: &'a NewCycleFormState, theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            state,
            active_cycle: None,
            theme,
            symbols,
        }
    }

    /// Disables the inputs and shows `cycle` in them.
    #[must_use]
    pub fn with_active_cycle(mut self, cycle: Option<&'a Cycle>) -> Self {
        self.active_cycle = cycle;
        self
    }

    fn is_disabled(&self) -> bool {
        self.active_cycle.is_some()
    }

    fn render_field(&self, buf: &mut Buffer, area: Rect, label: String, field: FormField) {
        let disabled = self.is_disabled();
        let is_focused = !disabled && self.state.focused_field == field;

        let label_style = if is_focused {
            self.theme.label.add_modifier(Modifier::BOLD)
        } else {
            self.theme.label
        };
        let label = if is_focused {
            format!("{} {label}", self.symbols.arrow)
        } else {
            label
        };

        let value = match (self.active_cycle, field) {
            (Some(cycle), FormField::Task) => cycle.task.clone(),
            (Some(cycle), FormField::Minutes) => cycle.minutes_amount.to_string(),
            (None, FormField::Task) => self.state.task.clone(),
            (None, FormField::Minutes) => self.state.minutes.clone(),
        };
        let value = if is_focused { format!("{value}_") } else { value };

        let (input_style, border_style) = if disabled {
            (self.theme.text_muted, self.theme.border)
        } else if is_focused {
            (self.theme.input_focused, self.theme.border_focused)
        } else {
            (self.theme.input_unfocused, self.theme.border)
        };

        let [label_area, input_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(3)]).areas(area);

        Paragraph::new(label).style(label_style).render(label_area, buf);
        Paragraph::new(value)
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).border_style(border_style))
            .render(input_area, buf);
    }

    fn render_button(&self, buf: &mut Buffer, area: Rect) {
        let (text, style) = if self.is_disabled() {
            (
                format!("{} Stop (Enter)  Pause (p)", self.symbols.stop),
                self.theme.button_stop,
            )
        } else if self.state.task.trim().is_empty() {
            (
                format!("{} Start (Enter)", self.symbols.start),
                self.theme.text_muted,
            )
        } else {
            (
                format!("{} Start (Enter)", self.symbols.start),
                self.theme.button_start,
            )
        };

        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

impl Widget for NewCycleFormWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" New cycle ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(self.theme.border)
            .style(Style::default().patch(self.theme.text_primary));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 20 || inner.height < 12 {
            Paragraph::new("Window too small")
                .style(self.theme.text_muted)
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        let padded = Rect::new(
            inner.x + H_PADDING,
            inner.y,
            inner.width.saturating_sub(H_PADDING * 2),
            inner.height,
        );
        let [task_area, minutes_area, error_area, _, button_area, _] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(padded);

        self.render_field(buf, task_area, "I will work on".to_string(), FormField::Task);
        self.render_field(
            buf,
            minutes_area,
            format!("for minutes (1-{}, Up/Down ±5)", self.state.max_minutes()),
            FormField::Minutes,
        );

        if let Some(ref error) = self.state.error {
            Paragraph::new(error.as_str())
                .style(self.theme.input_error)
                .render(error_area, buf);
        }

        self.render_button(buf, button_area);
    }
}
