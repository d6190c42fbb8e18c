//! Messages the inspected page's diagnostics channel pushes without being asked.
//!
//! The transport tags each message with the browser tab it came from; the
//! panel keeps only those for the tab it inspects, in a bounded log.

use std::collections::VecDeque;
use std::fmt;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Paragraph, Row, StatefulWidget, Table, TableState, Widget};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub const DEFAULT_MESSAGE_CAPACITY: usize = 500;
pub const HIGHLIGHT_INVALIDATIONS_LABEL: &str = "Highlight Widget Invalidations";

/// Browser tab a push message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.0)
    }
}

/// One diagnostic-channel message: `{ "tabId": 3, "eventId": "...", "data": {...} }`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub tab_id: TabId,
    pub event_id: String,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl PushMessage {
    pub fn new(tab_id: TabId, event_id: impl Into<String>) -> Self {
        Self {
            tab_id,
            event_id: event_id.into(),
            data: None,
        }
    }

    /// Decodes a message as delivered by the transport.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Newest-last log of push messages that forgets the oldest past `capacity`.
#[derive(Clone, Debug)]
pub struct MessageLog {
    messages: VecDeque<PushMessage>,
    capacity: usize,
    evicted: u64,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }
}

impl MessageLog {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            evicted: 0,
        }
    }

    /// Appends `message`; returns whether the oldest message was evicted to make room.
    pub fn push(&mut self, message: PushMessage) -> bool {
        let evicted = self.messages.len() >= self.capacity;
        if evicted {
            self.messages.pop_front();
            self.evicted += 1;
        }
        self.messages.push_back(message);
        evicted
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages dropped so far to stay within capacity.
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn get(&self, index: usize) -> Option<&PushMessage> {
        self.messages.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PushMessage> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// List of received event ids under the invalidation-highlight checkbox.
pub struct MessageLogView<'a> {
    log: &'a MessageLog,
    selected: Option<usize>,
    highlight_invalidations: bool,
    block: Option<Block<'a>>,
    highlight_style: Style,
    selected_style: Style,
}

impl<'a> MessageLogView<'a> {
    pub fn new(log: &'a MessageLog) -> Self {
        Self {
            log,
            selected: None,
            highlight_invalidations: false,
            block: None,
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            selected_style: Style::default().add_modifier(Modifier::BOLD),
        }
    }

    #[must_use]
    pub const fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub const fn highlight_invalidations(mut self, enabled: bool) -> Self {
        self.highlight_invalidations = enabled;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl StatefulWidget for MessageLogView<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        let [toggle_area, list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
        let mark = if self.highlight_invalidations { "x" } else { " " };
        Paragraph::new(format!("[{mark}] {HIGHLIGHT_INVALIDATIONS_LABEL}")).render(toggle_area, buf);

        if let Some(cursor) = state.selected()
            && cursor >= self.log.len()
        {
            state.select(self.log.len().checked_sub(1));
        }
        let rows = self.log.iter().enumerate().map(|(idx, message)| {
            let row = Row::new([message.event_id.clone()]);
            if self.selected == Some(idx) {
                row.style(self.selected_style)
            } else {
                row
            }
        });
        let table = Table::new(rows, [Constraint::Fill(1)]).row_highlight_style(self.highlight_style);
        StatefulWidget::render(table, list_area, buf, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectorError;
    use serde_json::json;

    #[test]
    fn decodes_camel_case_messages() {
        let message = PushMessage::from_value(json!({
            "tabId": 7,
            "eventId": "widget.invalidated",
            "data": { "widget": "TodoItem" }
        }))
        .unwrap();

        assert_eq!(message.tab_id, TabId(7));
        assert_eq!(message.event_id, "widget.invalidated");
        assert_eq!(message.data.and_then(|data| data.get("widget").cloned()), Some(json!("TodoItem")));
    }

    #[test]
    fn malformed_messages_are_decode_errors() {
        let result = PushMessage::from_value(json!({ "eventId": "x" }));

        assert!(matches!(result, Err(InspectorError::Decode(_))));
    }

    #[test]
    fn log_evicts_oldest_past_capacity() {
        let mut log = MessageLog::with_capacity(2);

        assert!(!log.push(PushMessage::new(TabId(1), "a")));
        assert!(!log.push(PushMessage::new(TabId(1), "b")));
        assert!(log.push(PushMessage::new(TabId(1), "c")));

        let ids: Vec<_> = log.iter().map(|message| message.event_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(log.evicted(), 1);
        assert_eq!(MessageLog::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn renders_checkbox_and_event_ids() {
        let mut log = MessageLog::default();
        log.push(PushMessage::new(TabId(1), "render.done"));
        let area = Rect::new(0, 0, 50, 4);
        let mut buffer = Buffer::empty(area);

        MessageLogView::new(&log)
            .highlight_invalidations(true)
            .render(area, &mut buffer, &mut TableState::default());

        let text: String = buffer.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(text.contains("[x] Highlight Widget Invalidations"));
        assert!(text.contains("render.done"));
    }
}
