//! Property-based invariants of snapshot materialization and expansion state.
//!
//! 1. Materialization is pure: the same snapshot yields identical items.
//! 2. Ids are unique and every child id extends its parent's id.
//! 3. A fully expanded lazy tree equals the eager materialization.
//! 4. Toggling a path twice restores the expansion set and the visible rows.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Map, Value};

use vdom_inspector::{
    ExpansionState, ItemTree, SerializedNode, StateValue, TreeItem, TreeModel, TreeViewState,
    materialize, materialize_state,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn state_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::String),
        prop::sample::select(vec!["@@undefined", "undefined", "@@symbol:s", "@@function:f", "[1,2]", "{\"a\":1}", "[oops"])
            .prop_map(|text| Value::String(text.to_owned())),
    ]
}

fn state_value() -> impl Strategy<Value = Value> {
    state_leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-z/~]{0,4}", inner, 0..5)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn vdom_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            prop::sample::select(vec!["div", "span", "li", ""]),
            prop::collection::vec(inner, 0..4),
            any::<bool>(),
        )
            .prop_map(|(tag, children, widget)| {
                if widget {
                    serde_json::json!({ "type": "wnode", "widgetConstructor": "W", "rendered": children })
                } else {
                    serde_json::json!({ "type": "hnode", "tag": tag, "children": children })
                }
            })
    })
}

fn assert_child_ids_extend_parent(item: &TreeItem) -> Result<(), TestCaseError> {
    for child in item.materialized_children() {
        prop_assert!(
            child.id.starts_with(&format!("{}/", item.id)),
            "child {} not under {}",
            child.id,
            item.id
        );
        assert_child_ids_extend_parent(child)?;
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Purity and id uniqueness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn state_materialization_is_pure(value in state_value()) {
        let first = materialize_state(&StateValue::from_value(value.clone()));
        let second = materialize_state(&StateValue::from_value(value));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn state_ids_are_unique(value in state_value()) {
        let root = materialize_state(&StateValue::from_value(value));
        let ids = root.ids();
        let unique: HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), unique.len());
        assert_child_ids_extend_parent(&root)?;
    }

    #[test]
    fn vdom_ids_are_unique(value in vdom_value()) {
        let root = materialize(&SerializedNode::from_value(value), "");
        prop_assert_eq!(root.id.as_str(), "/0");
        let ids = root.ids();
        let unique: HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), unique.len());
        assert_child_ids_extend_parent(&root)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Lazy tree matches eager materialization
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn expanded_lazy_tree_matches_materialization(value in vdom_value()) {
        let node = SerializedNode::from_value(value);
        let pure = materialize(&node, "");
        let expanded: ExpansionState = pure.ids().into_iter().collect();

        let mut tree = ItemTree::from_vdom(&node);
        tree.realize(&expanded);
        let lazy = tree.root().and_then(|root| tree.to_item(root));

        prop_assert_eq!(lazy, Some(pure));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Toggle idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn double_toggle_restores_view(value in state_value(), pick in any::<prop::sample::Index>()) {
        let state = StateValue::from_value(value);
        let ids: Vec<String> = materialize_state(&state).ids().into_iter().map(str::to_owned).collect();
        let path = pick.get(&ids).clone();

        let mut tree = ItemTree::from_state(&state);
        let mut view = TreeViewState::new();
        view.set_expanded("", true);
        view.sync(&mut tree);
        let before_expansion = view.expansion().clone();
        let before_rows = view.visible_len();

        view.toggle(&path);
        view.sync(&mut tree);
        view.toggle(&path);
        view.sync(&mut tree);

        prop_assert_eq!(view.expansion(), &before_expansion);
        prop_assert_eq!(view.visible_len(), before_rows);
    }
}
