//! Key/value listing of the selected item's properties with nested drill-down.

use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, StatefulWidget, Table, TableState, Widget};
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use crate::glyphs::TreeGlyphs;
use crate::path::{SEPARATOR, escape_segment, resolve_state};
use crate::snapshot::{NULL_TOKEN, StateValue, UNDEFINED_TOKEN, format_number, number_to_json};

/// Keys whose numeric values are render timings.
const TIMING_KEYS: [&str; 2] = ["innerRender", "outerRender"];

/// Identity of a (possibly nested) property row.
///
/// `root` is the top-level key and `sub_path` the `/`-joined escaped keys below
/// it, so identical nested shapes under different top-level keys never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    root: String,
    sub_path: String,
}

impl PropertyKey {
    pub fn top(key: impl Into<String>) -> Self {
        Self {
            root: key.into(),
            sub_path: String::new(),
        }
    }

    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        Self {
            root: self.root.clone(),
            sub_path: format!("{}{SEPARATOR}{}", self.sub_path, escape_segment(key)),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// Flat string form, `root` followed by the sub-path.
    pub fn token(&self) -> String {
        format!("{}{}", self.root, self.sub_path)
    }

    pub fn depth(&self) -> usize {
        self.sub_path.matches(SEPARATOR).count()
    }
}

/// Set of expanded property rows.
#[derive(Clone, Debug, Default)]
pub struct PropertyExpansion {
    expanded: FxHashSet<PropertyKey>,
}

impl PropertyExpansion {
    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.expanded.contains(key)
    }

    /// Flips membership of `key`; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, key: &PropertyKey) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.clone());
            true
        }
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// Listing options.
#[derive(Clone, Copy, Debug)]
pub struct PropertyOptions {
    pub sort: bool,
    /// Decimals used for render timings.
    pub precision: usize,
}

impl Default for PropertyOptions {
    fn default() -> Self {
        Self {
            sort: false,
            precision: 2,
        }
    }
}

/// One rendered line of the properties list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyRow {
    pub key: PropertyKey,
    pub name: String,
    pub value: String,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    /// Every other top-level row, for striping.
    pub alternate: bool,
}

/// Flattens `items` into rows, descending into expanded composite values.
pub fn property_rows(
    items: &Map<String, Value>,
    expansion: &PropertyExpansion,
    options: PropertyOptions,
) -> Vec<PropertyRow> {
    let mut rows = Vec::with_capacity(items.len());
    for (idx, (name, value)) in ordered(items.iter(), options.sort).into_iter().enumerate() {
        let key = PropertyKey::top(name.as_str());
        push_rows(&mut rows, key, name, value, idx % 2 == 1, expansion, options);
    }
    rows
}

fn push_rows(
    rows: &mut Vec<PropertyRow>,
    key: PropertyKey,
    name: &str,
    value: &Value,
    alternate: bool,
    expansion: &PropertyExpansion,
    options: PropertyOptions,
) {
    let children = nested_entries(value);
    let expandable = children.as_ref().is_some_and(|children| !children.is_empty());
    let expanded = expandable && expansion.contains(&key);
    rows.push(PropertyRow {
        depth: key.depth(),
        key: key.clone(),
        name: name.to_owned(),
        value: format_value(name, value, options.precision),
        expandable,
        expanded,
        alternate,
    });
    if !expanded {
        return;
    }
    let Some(children) = children else {
        return;
    };
    let entries = ordered(children.iter().map(|(name, value)| (name, value)), options.sort);
    for (name, value) in entries {
        push_rows(rows, key.child(name), name, value, alternate, expansion, options);
    }
}

fn ordered<'a, I>(entries: I, sort: bool) -> Vec<(&'a String, &'a Value)>
where
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    let mut entries: Vec<_> = entries.collect();
    if sort {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
}

/// Entries below a composite value; JSON-looking strings are parsed on demand.
fn nested_entries(value: &Value) -> Option<Vec<(String, Value)>> {
    match value {
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(idx, v)| (idx.to_string(), v.clone()))
                .collect(),
        ),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.len() < 2 || !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
                return None;
            }
            match serde_json::from_str::<Value>(text) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => nested_entries(&parsed),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Formats a property value; render timings get fixed decimals.
pub fn format_value(name: &str, value: &Value, precision: usize) -> String {
    match value {
        Value::Number(number) if TIMING_KEYS.contains(&name) => number
            .as_f64()
            .map_or_else(|| number.to_string(), |n| format!("{n:.precision$}")),
        Value::Number(number) => number
            .as_f64()
            .map_or_else(|| number.to_string(), format_number),
        Value::String(text) => text.clone(),
        Value::Null => "null".to_owned(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Describes the store-state value at `path` as `{path, type, value}`.
///
/// Unresolvable paths describe `undefined`.
pub fn key_properties(state: &StateValue, path: &str) -> Map<String, Value> {
    let resolved = resolve_state(state, path);
    let (kind, value) = match resolved.as_deref() {
        None | Some(StateValue::Undefined) => ("undefined", Value::from(UNDEFINED_TOKEN)),
        Some(StateValue::Null) => ("null", Value::from(NULL_TOKEN)),
        Some(StateValue::Bool(flag)) => ("boolean", Value::Bool(*flag)),
        Some(StateValue::Number(number)) => ("number", number_value(*number)),
        Some(StateValue::String(text)) => ("string", Value::from(text.as_str())),
        Some(StateValue::Symbol(description)) => {
            ("symbol", Value::from(format!("Symbol({description})")))
        }
        Some(StateValue::Function(name)) => (
            "function",
            Value::from(name.as_deref().unwrap_or("Anonymous")),
        ),
        Some(composite @ StateValue::Array(_)) => {
            ("array", Value::from(composite.to_json().to_string()))
        }
        Some(composite @ StateValue::Object(_)) => {
            ("object", Value::from(composite.to_json().to_string()))
        }
    };
    let mut out = Map::new();
    out.insert("path".to_owned(), Value::from(path));
    out.insert("type".to_owned(), Value::from(kind));
    out.insert("value".to_owned(), value);
    out
}

fn number_value(number: f64) -> Value {
    if number.is_finite() {
        number_to_json(number)
    } else {
        Value::from(format_number(number))
    }
}

/// Cursor and expansion of the properties list.
#[derive(Default)]
pub struct PropertyListState {
    table: TableState,
    expansion: PropertyExpansion,
    rows: Vec<PropertyRow>,
    has_items: bool,
}

impl PropertyListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn expansion(&self) -> &PropertyExpansion {
        &self.expansion
    }

    pub fn rows(&self) -> &[PropertyRow] {
        &self.rows
    }

    /// Whether the last refresh had something to list (possibly empty).
    pub const fn has_items(&self) -> bool {
        self.has_items
    }

    /// Rebuilds the rows for `items` (or none).
    pub fn refresh(&mut self, items: Option<&Map<String, Value>>, options: PropertyOptions) {
        self.has_items = items.is_some();
        self.rows = items.map_or_else(Vec::new, |items| property_rows(items, &self.expansion, options));
        if self.rows.is_empty() {
            self.table.select(None);
        } else if let Some(selected) = self.table.selected()
            && selected >= self.rows.len()
        {
            self.table.select(Some(self.rows.len() - 1));
        }
    }

    /// Forgets cursor and expansion, e.g. when the inspected item changes.
    pub fn reset(&mut self) {
        self.expansion.clear();
        self.table = TableState::default();
        self.rows.clear();
        self.has_items = false;
    }

    /// Toggles an expandable row; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, key: &PropertyKey) -> bool {
        let expandable = self
            .rows
            .iter()
            .any(|row| &row.key == key && row.expandable);
        if !expandable {
            return false;
        }
        self.expansion.toggle(key)
    }

    pub fn cursor_key(&self) -> Option<&PropertyKey> {
        self.table
            .selected()
            .and_then(|idx| self.rows.get(idx))
            .map(|row| &row.key)
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = self.table.selected().map_or(0, |idx| idx + 1);
        self.table.select(Some(next.min(self.rows.len() - 1)));
    }

    pub fn select_prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let prev = self.table.selected().unwrap_or(0).saturating_sub(1);
        self.table.select(Some(prev));
    }
}

/// Two-column key/value table; shows `empty` when there is nothing to list.
pub struct PropertyListView<'a> {
    block: Option<Block<'a>>,
    glyphs: TreeGlyphs<'a>,
    key_style: Style,
    alternate_style: Style,
    highlight_style: Style,
}

impl Default for PropertyListView<'_> {
    fn default() -> Self {
        Self {
            block: None,
            glyphs: TreeGlyphs::unicode(),
            key_style: Style::default().add_modifier(Modifier::BOLD),
            alternate_style: Style::default().add_modifier(Modifier::DIM),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }
}

impl<'a> PropertyListView<'a> {
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    #[must_use]
    pub const fn key_style(mut self, style: Style) -> Self {
        self.key_style = style;
        self
    }
}

impl StatefulWidget for PropertyListView<'_> {
    type State = PropertyListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = self.block.unwrap_or_else(|| Block::default().borders(Borders::NONE));
        if state.rows.is_empty() {
            Paragraph::new("empty").block(block).render(area, buf);
            return;
        }

        let rows = state.rows.iter().map(|row| {
            let marker = if !row.expandable {
                " "
            } else if row.expanded {
                self.glyphs.expanded
            } else {
                self.glyphs.collapsed
            };
            let name = Line::from(vec![
                Span::raw(self.glyphs.indent.repeat(row.depth)),
                Span::raw(marker),
                Span::raw(" "),
                Span::styled(row.name.clone(), self.key_style),
            ]);
            let mut out = Row::new([name, Line::from(row.value.clone())]);
            if row.alternate {
                out = out.style(self.alternate_style);
            }
            out
        });

        let table = Table::new(rows, [Constraint::Percentage(40), Constraint::Fill(1)])
            .block(block)
            .row_highlight_style(self.highlight_style);
        StatefulWidget::render(table, area, buf, &mut state.table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn render_timings_use_two_decimals() {
        let items = map(json!({ "innerRender": 1.23456, "outerRender": 2, "count": 3 }));
        let rows = property_rows(&items, &PropertyExpansion::default(), PropertyOptions::default());

        let values: Vec<_> = rows.iter().map(|row| row.value.as_str()).collect();
        assert_eq!(values, vec!["1.23", "2.00", "3"]);
    }

    #[test]
    fn nested_expansion_is_scoped_by_root_key() {
        let items = map(json!({ "a": { "x": 1 }, "b": { "x": 2 } }));
        let mut expansion = PropertyExpansion::default();
        expansion.toggle(&PropertyKey::top("a"));

        let rows = property_rows(&items, &expansion, PropertyOptions::default());

        let names: Vec<_> = rows.iter().map(|row| row.key.token()).collect();
        assert_eq!(names, vec!["a", "a/x", "b"]);
        assert_eq!(rows[1].depth, 1);
        assert_ne!(PropertyKey::top("a").child("x"), PropertyKey::top("b").child("x"));
    }

    #[test]
    fn nested_keys_with_separators_stay_distinct() {
        let nested = PropertyKey::top("a").child("x/y");
        let deeper = PropertyKey::top("a").child("x").child("y");

        assert_ne!(nested, deeper);
        assert_eq!(nested.depth(), 1);
        assert_eq!(deeper.depth(), 2);
    }

    #[test]
    fn slash_and_empty_keys_describe_their_own_values() {
        let state = StateValue::from_value(json!({
            "a/b": { "x": 1 },
            "a": { "b": { "y": 2 } },
            "o": { "": 5, "z": 1 }
        }));

        let top = key_properties(&state, "/a~1b");
        assert_eq!(top.get("value"), Some(&json!("{\"x\":1}")));
        let nested = key_properties(&state, "/a/b");
        assert_eq!(nested.get("value"), Some(&json!("{\"y\":2}")));
        let empty = key_properties(&state, "/o/");
        assert_eq!(empty.get("type"), Some(&json!("number")));
        assert_eq!(empty.get("value"), Some(&json!(5)));
    }

    #[test]
    fn json_strings_are_expandable() {
        let items = map(json!({ "raw": "[1,2]", "bad": "[1,,", "plain": "hi" }));
        let mut expansion = PropertyExpansion::default();
        expansion.toggle(&PropertyKey::top("raw"));

        let rows = property_rows(&items, &expansion, PropertyOptions::default());

        assert!(rows[0].expandable);
        assert_eq!(rows[1].key.token(), "raw/0");
        assert_eq!(rows[2].value, "2");
        let bad = rows.iter().find(|row| row.name == "bad");
        assert!(bad.is_some_and(|row| !row.expandable));
    }

    #[test]
    fn sorting_orders_keys() {
        let items = map(json!({ "b": 1, "a": 2 }));
        let options = PropertyOptions {
            sort: true,
            ..PropertyOptions::default()
        };

        let rows = property_rows(&items, &PropertyExpansion::default(), options);

        assert_eq!(rows[0].name, "a");
        assert!(rows[1].alternate);
    }

    #[test]
    fn key_properties_report_kind_and_value() {
        let state = StateValue::from_value(json!({
            "a": null,
            "b": "@@undefined",
            "c": "@@function:",
            "d": [1, 2],
            "e": 3
        }));

        let null = key_properties(&state, "/a");
        assert_eq!(null["type"], json!("null"));
        assert_eq!(null["value"], json!("@@null"));
        assert_eq!(key_properties(&state, "/b")["value"], json!("@@undefined"));
        assert_eq!(key_properties(&state, "/c")["value"], json!("Anonymous"));
        assert_eq!(key_properties(&state, "/d")["value"], json!("[1,2]"));
        assert_eq!(key_properties(&state, "/e")["type"], json!("number"));
        assert_eq!(key_properties(&state, "/missing")["type"], json!("undefined"));
        assert_eq!(key_properties(&state, "/a")["path"], json!("/a"));
    }

    #[test]
    fn state_toggle_ignores_leaves() {
        let items = map(json!({ "leaf": 1, "obj": { "k": true } }));
        let mut state = PropertyListState::new();
        state.refresh(Some(&items), PropertyOptions::default());

        assert!(!state.toggle(&PropertyKey::top("leaf")));
        assert!(state.toggle(&PropertyKey::top("obj")));
        state.refresh(Some(&items), PropertyOptions::default());
        assert_eq!(state.rows().len(), 3);
    }
}
