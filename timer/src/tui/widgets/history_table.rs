//! History table widget.
//!
//! Lists cycles newest first with task, duration, relative start and status.
//! Each status has its own symbol as well as its own color, so the table
//! stays readable without color.
//!
//! ```text
//! Task                 Duration     Started              Status
//! Review PR            40 minutes   less than a minute…  ◔ In progress
//! Write spec           25 minutes   about 2 hours ago    ✓ Completed
//! ```

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::history::HistoryEntry;
use crate::tui::app::{Symbols, Theme};
use crate::types::CycleStatus;

/// Widget for the cycle history.
#[derive(Debug)]
pub struct HistoryTableWidget<'a> {
    entries: &'a [HistoryEntry],
    /// Rows skipped at the top.
    offset: usize,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> HistoryTableWidget<'a> {
    /// Creates a table over `entries`, scrolled down by `offset` rows.
    #[must_use]
    pub fn new(
        entries: &'a [HistoryEntry],
        offset: usize,
        theme: &'a Theme,
        symbols: &'a Symbols,
    ) -> Self {
        Self {
            entries,
            offset,
            theme,
            symbols,
        }
    }

    fn status_style(&self, status: CycleStatus) -> Style {
        match status {
            CycleStatus::Running => self.theme.status_running,
            CycleStatus::Completed => self.theme.status_completed,
            CycleStatus::Interrupted => self.theme.status_interrupted,
        }
    }

    fn status_symbol(&self, status: CycleStatus) -> &'static str {
        match status {
            CycleStatus::Running => self.symbols.running,
            CycleStatus::Completed => self.symbols.completed,
            CycleStatus::Interrupted => self.symbols.interrupted,
        }
    }

    fn row(&self, entry: &'a HistoryEntry) -> Row<'a> {
        let status_style = self.status_style(entry.status);
        Row::new(vec![
            Cell::from(entry.task.as_str()),
            Cell::from(entry.duration.as_str()).style(self.theme.text_secondary),
            Cell::from(entry.started.as_str()).style(self.theme.text_secondary),
            Cell::from(Line::from(vec![
                Span::styled(self.status_symbol(entry.status), status_style),
                Span::raw(" "),
                Span::styled(entry.status.label(), status_style),
            ])),
        ])
    }
}

impl Widget for HistoryTableWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let block = Block::default()
            .title(format!(" My history ({}) ", self.entries.len()))
            .borders(Borders::ALL)
            .border_style(self.theme.border);

        if self.entries.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            let message = "No cycles yet";
            if inner.width as usize >= message.len() && inner.height > 0 {
                let x = inner.x + (inner.width - message.len() as u16) / 2;
                let y = inner.y + inner.height / 2;
                buf.set_string(x, y, message, self.theme.text_muted);
            }
            return;
        }

        let header = Row::new(["Task", "Duration", "Started", "Status"])
            .style(self.theme.title.add_modifier(Modifier::UNDERLINED));
        let rows: Vec<Row<'_>> = self
            .entries
            .iter()
            .skip(self.offset)
            .map(|entry| self.row(entry))
            .collect();

        Table::new(
            rows,
            [
                Constraint::Fill(1),
                Constraint::Length(12),
                Constraint::Length(24),
                Constraint::Length(16),
            ],
        )
        .header(header)
        .column_spacing(1)
        .block(block)
        .render(area, buf);
    }
}
