//! Conversion of snapshots into display-ready tree items.
//!
//! [`materialize`] and [`materialize_state`] are pure: the same snapshot always
//! yields the same item structure and ids. The same single-level description
//! functions back the lazy [`ItemTree`](crate::ItemTree), which only descends
//! into a node once it is expanded.

use std::fmt;

use crate::path::{child_path, key_path};
use crate::snapshot::{NULL_TOKEN, SerializedNode, StateValue, UNDEFINED_TOKEN, format_number};

/// Visual class of an item; every runtime kind maps to a distinct class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconClass {
    Null,
    Undefined,
    String,
    Number,
    Boolean,
    Symbol,
    Function,
    Array,
    Object,
    HNode,
    WNode,
}

impl IconClass {
    /// Short class name, stable across releases.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "bool",
            Self::Symbol => "symbol",
            Self::Function => "func",
            Self::Array => "arr",
            Self::Object => "obj",
            Self::HNode => "hnode",
            Self::WNode => "wnode",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Undefined => "Undefined",
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Symbol => "Symbol",
            Self::Function => "Function",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::HNode => "Virtual DOM",
            Self::WNode => "Widget",
        }
    }
}

/// Structured label: an optional property key, the value text and an optional identity-key badge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemLabel {
    pub key: Option<String>,
    pub text: String,
    pub badge: Option<String>,
}

impl fmt::Display for ItemLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.key {
            write!(f, "{key}: ")?;
        }
        f.write_str(&self.text)?;
        if let Some(badge) = &self.badge {
            write!(f, " [{badge}]")?;
        }
        Ok(())
    }
}

/// A string value that looks like serialized JSON and can be drilled into on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedJson {
    raw: String,
}

impl EmbeddedJson {
    /// Wraps the string if it looks like a JSON array or object.
    pub fn detect(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let looks_like_json = trimmed.len() > 1 && (trimmed.starts_with('[') || trimmed.starts_with('{'));
        looks_like_json.then(|| Self {
            raw: text.to_owned(),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parses the string and materializes its entries under `parent_id`.
    ///
    /// Returns `None` when the string is not valid JSON.
    pub fn expand(&self, parent_id: &str) -> Option<Vec<TreeItem>> {
        let entries = embedded_entries(&self.raw)?;
        Some(
            entries
                .into_iter()
                .map(|(key, value)| build(describe_state(Some(key), value, parent_id)))
                .collect(),
        )
    }
}

/// Parses a JSON-looking string into state; `None` if it does not look like JSON or fails to parse.
pub fn parse_embedded(text: &str) -> Option<StateValue> {
    EmbeddedJson::detect(text)?;
    serde_json::from_str(text).ok().map(StateValue::from_value)
}

fn embedded_entries(raw: &str) -> Option<Vec<(String, StateValue)>> {
    match parse_embedded(raw) {
        Some(StateValue::Array(items)) => Some(indexed(items)),
        Some(StateValue::Object(entries)) => Some(entries),
        Some(_) => None,
        None => {
            tracing::debug!(len = raw.len(), "embedded JSON failed to parse, keeping literal");
            None
        }
    }
}

fn indexed(items: Vec<StateValue>) -> Vec<(String, StateValue)> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, value)| (idx.to_string(), value))
        .collect()
}

/// Children of a composite item.
#[derive(Clone, Debug, PartialEq)]
pub enum Children {
    Materialized(Vec<TreeItem>),
    /// JSON embedded in a string, parsed only when expanded.
    Deferred(EmbeddedJson),
}

/// A display-ready tree node.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeItem {
    /// Unique structural path from the root.
    pub id: String,
    pub label: ItemLabel,
    pub title: String,
    pub icon: Option<IconClass>,
    pub children: Option<Children>,
}

impl TreeItem {
    pub fn is_expandable(&self) -> bool {
        match &self.children {
            Some(Children::Materialized(children)) => !children.is_empty(),
            Some(Children::Deferred(_)) => true,
            None => false,
        }
    }

    /// Returns the materialized children (empty for leaves and unexpanded deferred JSON).
    pub fn materialized_children(&self) -> &[Self] {
        match &self.children {
            Some(Children::Materialized(children)) => children,
            Some(Children::Deferred(_)) | None => &[],
        }
    }

    /// Parses deferred JSON children in place.
    ///
    /// Returns whether the item is expandable afterwards; invalid JSON turns it into a plain leaf.
    pub fn expand_deferred(&mut self) -> bool {
        let parsed = match &self.children {
            Some(Children::Deferred(json)) => Some(json.expand(&self.id)),
            _ => None,
        };
        if let Some(children) = parsed {
            self.children = children.map(Children::Materialized);
        }
        self.is_expandable()
    }

    /// Finds a descendant (or self) by id among materialized items.
    pub fn find(&self, id: &str) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        if !id.starts_with(self.id.as_str()) {
            return None;
        }
        self.materialized_children()
            .iter()
            .find_map(|child| child.find(id))
    }

    /// Returns all materialized ids in depth-first order.
    pub fn ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(item) = stack.pop() {
            out.push(item.id.as_str());
            stack.extend(item.materialized_children().iter().rev());
        }
        out
    }
}

/// Materializes a vDOM snapshot whose root sits at index 0 under `prefix`.
pub fn materialize(node: &SerializedNode, prefix: &str) -> TreeItem {
    materialize_at(node, prefix, 0)
}

/// Materializes a vDOM node at the given index under `prefix`.
pub fn materialize_at(node: &SerializedNode, prefix: &str, index: usize) -> TreeItem {
    build(describe_vdom(node.clone(), prefix, index))
}

/// Materializes a store-state snapshot; the root has the empty path and the label `/`.
pub fn materialize_state(state: &StateValue) -> TreeItem {
    build(describe_state_root(state.clone()))
}

fn build(described: Described) -> TreeItem {
    let Described {
        id,
        label,
        title,
        icon,
        pending,
    } = described;
    let children = match pending {
        None => None,
        Some(Pending::Embedded(json)) => Some(Children::Deferred(json)),
        Some(pending) => pending
            .expand(&id)
            .map(|children| Children::Materialized(children.into_iter().map(build).collect())),
    };
    TreeItem {
        id,
        label,
        title,
        icon,
        children,
    }
}

/// Item header plus the not-yet-materialized source of its children.
pub(crate) struct Described {
    pub(crate) id: String,
    pub(crate) label: ItemLabel,
    pub(crate) title: String,
    pub(crate) icon: Option<IconClass>,
    pub(crate) pending: Option<Pending>,
}

pub(crate) enum Pending {
    Vdom(Vec<SerializedNode>),
    State(Vec<(String, StateValue)>),
    Embedded(EmbeddedJson),
}

impl Pending {
    /// Describes the next level; `None` when embedded JSON turns out to be invalid.
    pub(crate) fn expand(self, parent_id: &str) -> Option<Vec<Described>> {
        match self {
            Self::Vdom(children) => Some(
                children
                    .into_iter()
                    .enumerate()
                    .map(|(idx, child)| describe_vdom(child, parent_id, idx))
                    .collect(),
            ),
            Self::State(entries) => Some(
                entries
                    .into_iter()
                    .map(|(key, value)| describe_state(Some(key), value, parent_id))
                    .collect(),
            ),
            Self::Embedded(json) => embedded_entries(&json.raw).map(|entries| {
                entries
                    .into_iter()
                    .map(|(key, value)| describe_state(Some(key), value, parent_id))
                    .collect()
            }),
        }
    }
}

fn leaf(id: String, label: ItemLabel, icon: IconClass) -> Described {
    Described {
        title: format!("{} - {id}", icon.title()),
        id,
        label,
        icon: Some(icon),
        pending: None,
    }
}

pub(crate) fn describe_vdom(node: SerializedNode, prefix: &str, index: usize) -> Described {
    let id = child_path(prefix, index);
    let badge = node.key();
    let (text, icon) = match &node {
        SerializedNode::Null => {
            return leaf(id, text_label(NULL_TOKEN), IconClass::Null);
        }
        SerializedNode::Undefined => {
            return leaf(id, text_label(UNDEFINED_TOKEN), IconClass::Undefined);
        }
        SerializedNode::Text(text) => {
            return leaf(id, text_label(&quoted(text)), IconClass::String);
        }
        SerializedNode::HNode(element) => {
            let text = if !element.tag.is_empty() {
                element.tag.clone()
            } else if let Some(text) = element.text.as_deref().filter(|text| !text.is_empty()) {
                quoted(text)
            } else {
                "Virtual DOM".to_owned()
            };
            (text, IconClass::HNode)
        }
        SerializedNode::WNode(widget) => {
            let text = if widget.widget_constructor.is_empty() {
                "Widget".to_owned()
            } else {
                widget.widget_constructor.clone()
            };
            (text, IconClass::WNode)
        }
    };
    let children = node.into_child_nodes();
    Described {
        title: format!("{} - {id}", icon.title()),
        id,
        label: ItemLabel {
            key: None,
            text,
            badge,
        },
        icon: Some(icon),
        pending: (!children.is_empty()).then_some(Pending::Vdom(children)),
    }
}

pub(crate) fn describe_state_root(state: StateValue) -> Described {
    let mut described = describe_state_value(None, state, String::new());
    if described.pending.is_some() || matches!(described.icon, Some(IconClass::Array | IconClass::Object)) {
        described.label.text = "/".to_owned();
    }
    described
}

pub(crate) fn describe_state(key: Option<String>, value: StateValue, prefix: &str) -> Described {
    let id = key.as_deref().map_or_else(String::new, |key| key_path(prefix, key));
    describe_state_value(key, value, id)
}

fn describe_state_value(key: Option<String>, value: StateValue, id: String) -> Described {
    let keyed = |text: String| ItemLabel {
        key: key.clone(),
        text,
        badge: None,
    };
    match value {
        StateValue::Null => leaf(id, keyed(NULL_TOKEN.to_owned()), IconClass::Null),
        StateValue::Undefined => leaf(id, keyed(UNDEFINED_TOKEN.to_owned()), IconClass::Undefined),
        StateValue::Bool(flag) => leaf(id, keyed(flag.to_string()), IconClass::Boolean),
        StateValue::Number(number) => leaf(id, keyed(format_number(number)), IconClass::Number),
        StateValue::Symbol(description) => {
            leaf(id, keyed(format!("Symbol({description})")), IconClass::Symbol)
        }
        StateValue::Function(name) => leaf(
            id,
            keyed(name.unwrap_or_else(|| "[Anonymous]".to_owned())),
            IconClass::Function,
        ),
        StateValue::String(text) => {
            let pending = EmbeddedJson::detect(&text).map(Pending::Embedded);
            let mut described = leaf(id, keyed(quoted(&text)), IconClass::String);
            described.pending = pending;
            described
        }
        StateValue::Array(items) => {
            let mut described = leaf(id, keyed("Array".to_owned()), IconClass::Array);
            described.pending = (!items.is_empty()).then(|| Pending::State(indexed(items)));
            described
        }
        StateValue::Object(entries) => {
            let mut described = leaf(id, keyed("Object".to_owned()), IconClass::Object);
            described.pending = (!entries.is_empty()).then_some(Pending::State(entries));
            described
        }
    }
}

fn text_label(text: &str) -> ItemLabel {
    ItemLabel {
        key: None,
        text: text.to_owned(),
        badge: None,
    }
}

fn quoted(text: &str) -> String {
    format!("\"{text}\"")
}
