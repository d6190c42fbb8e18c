//! Snapshot payloads produced by the inspected page.
//!
//! Decoding is total: the page evolves independently of the panel, so any
//! shape that does not match is degraded to an empty leaf instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Sentinel the page uses for the literal `undefined` value.
pub const UNDEFINED_TOKEN: &str = "@@undefined";
/// Sentinel used when displaying the literal `null` value.
pub const NULL_TOKEN: &str = "@@null";

const SYMBOL_PREFIX: &str = "@@symbol:";
const FUNCTION_PREFIX: &str = "@@function:";

/// A serialized virtual-DOM node.
#[derive(Clone, Debug, PartialEq)]
pub enum SerializedNode {
    Null,
    Undefined,
    Text(String),
    HNode(HNode),
    WNode(WNode),
}

/// A serialized element node (`type: "hnode"`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HNode {
    pub tag: String,
    pub text: Option<String>,
    pub properties: Map<String, Value>,
    pub children: Vec<SerializedNode>,
}

/// A serialized widget node (`type: "wnode"`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WNode {
    pub widget_constructor: String,
    pub properties: Map<String, Value>,
    pub rendered: Vec<SerializedNode>,
}

impl SerializedNode {
    /// Decodes a node from a JSON value, degrading malformed shapes to `Undefined`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            Value::Object(mut fields) => {
                let kind = fields
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                match kind.as_deref() {
                    Some("hnode") => Self::HNode(HNode {
                        tag: take_string(&mut fields, "tag").unwrap_or_default(),
                        text: take_string(&mut fields, "text"),
                        properties: take_map(&mut fields, "properties"),
                        children: take_nodes(&mut fields, "children"),
                    }),
                    Some("wnode") => Self::WNode(WNode {
                        widget_constructor: take_string(&mut fields, "widgetConstructor")
                            .unwrap_or_default(),
                        properties: take_map(&mut fields, "properties"),
                        rendered: take_nodes(&mut fields, "rendered"),
                    }),
                    other => {
                        tracing::debug!(kind = ?other, "unrecognised node type, rendering as empty leaf");
                        Self::Undefined
                    }
                }
            }
            other => {
                tracing::debug!(value = %other, "malformed node, rendering as empty leaf");
                Self::Undefined
            }
        }
    }

    /// Returns the node's properties when it is an element or widget.
    pub const fn properties(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::HNode(node) => Some(&node.properties),
            Self::WNode(node) => Some(&node.properties),
            Self::Null | Self::Undefined | Self::Text(_) => None,
        }
    }

    /// Returns the identity key declared through `properties.key`, if it is a string or number.
    pub fn key(&self) -> Option<String> {
        match self.properties()?.get("key")? {
            Value::String(key) => Some(key.clone()),
            Value::Number(key) => key.as_f64().map(format_number),
            _ => None,
        }
    }

    /// Returns the relevant child list: `children` for elements, `rendered` for widgets.
    pub fn child_nodes(&self) -> &[Self] {
        match self {
            Self::HNode(node) => &node.children,
            Self::WNode(node) => &node.rendered,
            Self::Null | Self::Undefined | Self::Text(_) => &[],
        }
    }

    pub(crate) fn into_child_nodes(self) -> Vec<Self> {
        match self {
            Self::HNode(node) => node.children,
            Self::WNode(node) => node.rendered,
            Self::Null | Self::Undefined | Self::Text(_) => Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for SerializedNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn take_string(fields: &mut Map<String, Value>, name: &str) -> Option<String> {
    match fields.remove(name)? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn take_map(fields: &mut Map<String, Value>, name: &str) -> Map<String, Value> {
    match fields.remove(name) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn take_nodes(fields: &mut Map<String, Value>, name: &str) -> Vec<SerializedNode> {
    match fields.remove(name) {
        Some(Value::Array(items)) => items.into_iter().map(SerializedNode::from_value).collect(),
        _ => Vec::new(),
    }
}

/// Runtime kind of a store-state value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Undefined,
    Boolean,
    Number,
    String,
    Symbol,
    Function,
    Array,
    Object,
}

impl ValueKind {
    /// Lower-case kind name as reported in property listings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Function => "function",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Arbitrary JSON-like store state, including the non-JSON kinds the page encodes with sentinels.
#[derive(Clone, Debug, PartialEq)]
pub enum StateValue {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    /// Symbol description.
    Symbol(String),
    /// Function name (`None` for anonymous functions).
    Function(Option<String>),
    Array(Vec<StateValue>),
    /// Entries in insertion order.
    Object(Vec<(String, StateValue)>),
}

impl StateValue {
    /// Decodes a value from JSON, interpreting `@@undefined`, `@@symbol:` and `@@function:` sentinels.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) => Self::from_string(text),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_value).collect()),
            Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_value(value)))
                    .collect(),
            ),
        }
    }

    fn from_string(text: String) -> Self {
        if text == UNDEFINED_TOKEN {
            return Self::Undefined;
        }
        if let Some(description) = text.strip_prefix(SYMBOL_PREFIX) {
            return Self::Symbol(description.to_owned());
        }
        if let Some(name) = text.strip_prefix(FUNCTION_PREFIX) {
            return Self::Function((!name.is_empty()).then(|| name.to_owned()));
        }
        Self::String(text)
    }

    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Undefined => ValueKind::Undefined,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Symbol(_) => ValueKind::Symbol,
            Self::Function(_) => ValueKind::Function,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Converts back to JSON; non-JSON kinds become their sentinel strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Undefined => Value::String(UNDEFINED_TOKEN.to_owned()),
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => number_to_json(*number),
            Self::String(text) => Value::String(text.clone()),
            Self::Symbol(description) => Value::String(format!("{SYMBOL_PREFIX}{description}")),
            Self::Function(name) => Value::String(format!(
                "{FUNCTION_PREFIX}{}",
                name.as_deref().unwrap_or_default()
            )),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// A single entry of the inspected page's event log.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventLogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: f64,
    pub level: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<Map<String, Value>>,
}

/// Converts a number to JSON, keeping integral values integral; non-finite values become `null`.
pub fn number_to_json(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let integral = value as i64;
        return Value::from(integral);
    }
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Formats a number the way the page's runtime prints it (`1`, not `1.0`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let integral = value as i64;
        integral.to_string()
    } else if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        format!("{sign}Infinity")
    } else {
        value.to_string()
    }
}
