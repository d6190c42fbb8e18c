//! Structural path addressing for snapshot trees.
//!
//! A path is `/`-delimited: each segment is a zero-based child index (vDOM
//! children, rendered lists, arrays) or a property key (objects). Keys are
//! escaped JSON-Pointer style (`~` as `~0`, `/` as `~1`), so `"a/b"` and
//! `a` → `b` get distinct paths and an empty key is an empty segment. The root
//! prefix is the empty string. Paths are positional, so a path taken from one
//! snapshot is not guaranteed to name the same logical node in the next.

use std::borrow::Cow;
use std::fmt::Display;

use crate::materialize::parse_embedded;
use crate::snapshot::{SerializedNode, StateValue};

pub const SEPARATOR: char = '/';

/// Returns `"{prefix}/{segment}"`.
pub fn child_path(prefix: &str, segment: impl Display) -> String {
    format!("{prefix}{SEPARATOR}{segment}")
}

/// Returns the path of object member `key` below `prefix`.
pub fn key_path(prefix: &str, key: &str) -> String {
    child_path(prefix, escape_segment(key))
}

pub fn escape_segment(key: &str) -> Cow<'_, str> {
    if key.contains(['~', SEPARATOR]) {
        Cow::Owned(key.replace('~', "~0").replace(SEPARATOR, "~1"))
    } else {
        Cow::Borrowed(key)
    }
}

pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Iterates over the raw segments after the root prefix; empty segments are kept.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix(SEPARATOR)
        .into_iter()
        .flat_map(|rest| rest.split(SEPARATOR))
}

/// Returns the parent path, or `None` for the root prefix.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|idx| &path[..idx])
}

/// Returns the proper ancestors of a path, outermost first (including the empty root prefix).
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some(parent) = parent_path(current) {
        out.push(parent);
        current = parent;
    }
    out.reverse();
    out
}

/// Resolves a vDOM path; the first segment addresses the root itself.
pub fn find_vdom<'a>(root: &'a SerializedNode, path: &str) -> Option<&'a SerializedNode> {
    let mut segments = segments(path);
    let first: usize = segments.next()?.parse().ok()?;
    if first != 0 {
        return None;
    }
    let mut current = root;
    for segment in segments {
        let index: usize = segment.parse().ok()?;
        current = current.child_nodes().get(index)?;
    }
    Some(current)
}

/// Resolves a store-state path, drilling into JSON-looking strings when a segment continues past them.
pub fn resolve_state<'a>(state: &'a StateValue, path: &str) -> Option<Cow<'a, StateValue>> {
    let mut current = Cow::Borrowed(state);
    for segment in segments(path) {
        let segment = unescape_segment(segment);
        let segment = segment.as_ref();
        current = match current {
            Cow::Borrowed(value) => step(value, segment)?,
            Cow::Owned(value) => Cow::Owned(step(&value, segment)?.into_owned()),
        };
    }
    Some(current)
}

fn step<'a>(value: &'a StateValue, segment: &str) -> Option<Cow<'a, StateValue>> {
    match value {
        StateValue::Object(entries) => entries
            .iter()
            .find(|(key, _)| key == segment)
            .map(|(_, value)| Cow::Borrowed(value)),
        StateValue::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .map(Cow::Borrowed),
        StateValue::String(text) => {
            let parsed = parse_embedded(text)?;
            step(&parsed, segment).map(|value| Cow::Owned(value.into_owned()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_paths_extend_prefix() {
        assert_eq!(child_path("", 0), "/0");
        assert_eq!(child_path("/0", "items"), "/0/items");
    }

    #[test]
    fn ancestors_are_outermost_first() {
        assert_eq!(ancestors("/0/1/2"), vec!["", "/0", "/0/1"]);
        assert!(ancestors("").is_empty());
    }

    #[test]
    fn finds_vdom_nodes_through_rendered_and_children() {
        let root = SerializedNode::from_value(json!({
            "type": "wnode",
            "widgetConstructor": "App",
            "rendered": [{ "type": "hnode", "tag": "div", "children": ["a", "b"] }]
        }));

        assert_eq!(find_vdom(&root, "/0"), Some(&root));
        assert_eq!(
            find_vdom(&root, "/0/0/1"),
            Some(&SerializedNode::Text("b".into()))
        );
        assert_eq!(find_vdom(&root, "/0/3"), None);
        assert_eq!(find_vdom(&root, ""), None);
    }

    #[test]
    fn resolves_state_through_embedded_json() {
        let state = StateValue::from_value(json!({ "todos": { "list": "[1,2,{\"done\":true}]" } }));

        let value = resolve_state(&state, "/todos/list/2/done").map(Cow::into_owned);
        assert_eq!(value, Some(StateValue::Bool(true)));
        assert!(resolve_state(&state, "/todos/missing").is_none());
    }

    #[test]
    fn key_paths_escape_separators_and_tildes() {
        assert_eq!(key_path("", "a/b"), "/a~1b");
        assert_eq!(key_path("/x", "~/"), "/x/~0~1");
        assert_eq!(key_path("/o", ""), "/o/");
        assert_eq!(unescape_segment("~0~1"), "~/");
        assert_eq!(unescape_segment("~01"), "~1");
    }

    #[test]
    fn resolves_slash_and_empty_keys_distinctly() {
        let state = StateValue::from_value(json!({
            "a/b": { "x": 1 },
            "a": { "b": { "y": 2 } },
            "o": { "": 5, "z": 1 }
        }));

        let value = |path: &str| resolve_state(&state, path).map(Cow::into_owned);
        assert_eq!(value(&key_path("", "a/b")), Some(StateValue::from_value(json!({ "x": 1 }))));
        assert_eq!(value("/a/b"), Some(StateValue::from_value(json!({ "y": 2 }))));
        assert_eq!(value(&key_path("/o", "")), Some(StateValue::Number(5.0)));
        assert_eq!(segments("/o/").collect::<Vec<_>>(), vec!["o", ""]);
        assert_eq!(segments("").count(), 0);
    }
}
