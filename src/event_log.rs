//! Tabular view of the inspected page's event log.

use chrono::{DateTime, SecondsFormat, Utc};
use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Row, StatefulWidget, Table, TableState};

use crate::snapshot::EventLogEntry;

const HEADER: [&str; 4] = ["Time", "Level", "Type", "Information"];

/// Formats a millisecond timestamp as an ISO-8601 UTC string (`2018-01-02T03:04:05.678Z`).
///
/// Timestamps outside chrono's range fall back to the raw number.
pub fn format_timestamp(millis: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let whole = millis.trunc() as i64;
    DateTime::<Utc>::from_timestamp_millis(whole).map_or_else(
        || millis.to_string(),
        |time| time.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Single-line rendering of an entry's `data`.
pub fn format_information(entry: &EventLogEntry) -> String {
    entry
        .data
        .as_ref()
        .map(|data| serde_json::Value::Object(data.clone()).to_string())
        .unwrap_or_default()
}

/// Cursor over the event rows.
#[derive(Default)]
pub struct EventLogState {
    table: TableState,
}

impl EventLogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.table.selected()
    }

    pub fn set_cursor(&mut self, index: Option<usize>) {
        self.table.select(index);
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.table.select(None);
            return;
        }
        let next = self.table.selected().map_or(0, |idx| idx + 1);
        self.table.select(Some(next.min(len - 1)));
    }

    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            self.table.select(None);
            return;
        }
        let prev = self.table.selected().unwrap_or(0).saturating_sub(1);
        self.table.select(Some(prev));
    }
}

/// Time, level, type and information columns; renders nothing without a log.
pub struct EventLogView<'a> {
    entries: Option<&'a [EventLogEntry]>,
    selected: Option<usize>,
    block: Option<Block<'a>>,
    header_style: Style,
    highlight_style: Style,
    selected_style: Style,
}

impl<'a> EventLogView<'a> {
    pub fn new(entries: Option<&'a [EventLogEntry]>) -> Self {
        Self {
            entries,
            selected: None,
            block: None,
            header_style: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            selected_style: Style::default().add_modifier(Modifier::BOLD),
        }
    }

    /// Marks the event currently shown in the properties list.
    #[must_use]
    pub const fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl StatefulWidget for EventLogView<'_> {
    type State = EventLogState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let Some(entries) = self.entries else {
            return;
        };
        if let Some(cursor) = state.table.selected()
            && cursor >= entries.len()
        {
            state.table.select(entries.len().checked_sub(1));
        }

        let rows = entries.iter().enumerate().map(|(idx, entry)| {
            let row = Row::new([
                format_timestamp(entry.timestamp),
                entry.level.clone(),
                entry.kind.clone(),
                format_information(entry),
            ]);
            if self.selected == Some(idx) {
                row.style(self.selected_style)
            } else {
                row
            }
        });
        let widths = [
            Constraint::Length(24),
            Constraint::Length(8),
            Constraint::Length(16),
            Constraint::Fill(1),
        ];
        let mut table = Table::new(rows, widths)
            .header(Row::new(HEADER).style(self.header_style))
            .row_highlight_style(self.highlight_style);
        if let Some(block) = self.block {
            table = table.block(block);
        }
        StatefulWidget::render(table, area, buf, &mut state.table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_are_iso_utc_with_millis() {
        assert_eq!(format_timestamp(1_514_862_245_678.0), "2018-01-02T03:04:05.678Z");
    }

    #[test]
    fn information_is_compact_json() {
        let entry: EventLogEntry = serde_json::from_value(json!({
            "timestamp": 0,
            "level": "info",
            "type": "store:command",
            "data": { "a": 1 }
        }))
        .unwrap();

        assert_eq!(format_information(&entry), r#"{"a":1}"#);
        assert_eq!(format_information(&EventLogEntry::default()), "");
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut state = EventLogState::new();
        state.select_next(2);
        state.select_next(2);
        state.select_next(2);
        assert_eq!(state.cursor(), Some(1));

        state.select_prev(2);
        state.select_prev(2);
        assert_eq!(state.cursor(), Some(0));

        state.select_next(0);
        assert_eq!(state.cursor(), None);
    }

    #[test]
    fn renders_header_and_rows() {
        let entries = vec![EventLogEntry {
            timestamp: 0.0,
            level: "info".into(),
            kind: "render".into(),
            data: None,
        }];
        let area = Rect::new(0, 0, 80, 3);
        let mut buffer = Buffer::empty(area);
        let mut state = EventLogState::new();

        EventLogView::new(Some(entries.as_slice())).render(area, &mut buffer, &mut state);

        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains("Information"));
        assert!(text.contains("1970-01-01T00:00:00.000Z"));
    }
}
